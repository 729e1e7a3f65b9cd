use std::cmp::Ordering;

/// A parsed API version string, ordered by Kubernetes version priority.
///
/// Greater means "more preferred": stable releases beat betas, betas beat alphas,
/// higher major (then minor) numbers win within a track, and anything that is not a
/// `vN[alpha|beta][M]` string sorts below every conformant version.
///
/// ```
/// use restmapper_core::Version;
/// use std::cmp::Reverse;
/// let mut served = vec!["v1beta1", "foo", "v2alpha1", "v1", "v2"];
/// served.sort_by_cached_key(|v| Reverse(Version::parse(v)));
/// assert_eq!(served, vec!["v2", "v1", "v1beta1", "v2alpha1", "foo"]);
/// ```
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Version {
    /// A GA release
    Stable(u32),
    /// A beta release of a major version
    Beta(u32, Option<u32>),
    /// An alpha release of a major version
    Alpha(u32, Option<u32>),
    /// Any other string; CRDs and aggregated APIs may serve arbitrary versions
    Nonconformant(String),
}

impl Version {
    /// Parse a version string, falling back to [`Version::Nonconformant`]
    pub fn parse(v: &str) -> Version {
        Self::try_parse(v).unwrap_or_else(|| Version::Nonconformant(v.to_string()))
    }

    fn try_parse(v: &str) -> Option<Version> {
        let rest = v.strip_prefix('v')?;
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let major: u32 = rest[..digits].parse().ok()?;
        let rest = &rest[digits..];
        if rest.is_empty() {
            return Some(Version::Stable(major));
        }
        let (track, suffix): (fn(u32, Option<u32>) -> Version, &str) =
            if let Some(suffix) = rest.strip_prefix("alpha") {
                (Version::Alpha, suffix)
            } else if let Some(suffix) = rest.strip_prefix("beta") {
                (Version::Beta, suffix)
            } else {
                return None;
            };
        let minor = if suffix.is_empty() {
            None
        } else {
            Some(suffix.parse().ok()?)
        };
        Some(track(major, minor))
    }

    fn rank(&self) -> u8 {
        match self {
            Version::Stable(_) => 3,
            Version::Beta(..) => 2,
            Version::Alpha(..) => 1,
            Version::Nonconformant(_) => 0,
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        use Version::*;
        match (self, other) {
            (Stable(a), Stable(b)) => a.cmp(b),
            (Beta(a, x), Beta(b, y)) | (Alpha(a, x), Alpha(b, y)) => a.cmp(b).then(x.cmp(y)),
            // lexicographically earlier strings are preferred
            (Nonconformant(a), Nonconformant(b)) => b.cmp(a),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
