//! Release ordering and partial version completion
//!
//! Ordering rules:
//! - main versions compare component-wise as integers, missing components are zero
//! - a release is greater than any pre-release of the same main version
//! - pre-release tiers order `alpha`/`a` < `beta`/`b` < `rc`/`c`, then by number

use std::cmp::Ordering;

use crate::release::version::{is_canonical, is_prerelease, normalize};

/// Keyword resolved to the latest stable release
pub const LATEST_KEYWORD: &str = "latest";

/// Compares two version strings, with or without the `v` prefix
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left = left.strip_prefix('v').unwrap_or(left);
    let right = right.strip_prefix('v').unwrap_or(right);

    let (left_main, left_pre) = split_prerelease(left);
    let (right_main, right_pre) = split_prerelease(right);

    compare_main(left_main, right_main).then_with(|| match (left_pre, right_pre) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(l), Some(r)) => PreRelease::parse(l).cmp(&PreRelease::parse(r)),
    })
}

fn split_prerelease(version: &str) -> (&str, Option<&str>) {
    match version.split_once('-') {
        Some((main, pre)) => (main, Some(pre)),
        None => (version, None),
    }
}

fn compare_main(left: &str, right: &str) -> Ordering {
    let left: Vec<Digits> = left.split('.').map(Digits::parse).collect();
    let right: Vec<Digits> = right.split('.').map(Digits::parse).collect();

    (0..left.len().max(right.len()))
        .map(|i| {
            let l = left.get(i).unwrap_or(&Digits::ZERO);
            let r = right.get(i).unwrap_or(&Digits::ZERO);
            l.cmp(r)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Decimal component of any length, compared by value
///
/// Leading zeros are dropped, so zero is the empty string. Components that
/// are not purely digits count as zero.
#[derive(Debug, PartialEq, Eq)]
struct Digits<'a>(&'a str);

impl<'a> Digits<'a> {
    const ZERO: Digits<'static> = Digits("");

    fn parse(component: &'a str) -> Self {
        if component.bytes().all(|b| b.is_ascii_digit()) {
            Digits(component.trim_start_matches('0'))
        } else {
            Digits("")
        }
    }
}

impl Ord for Digits<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(other.0))
    }
}

impl PartialOrd for Digits<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pre-release tag reduced to its single-letter class and number
///
/// Field order matters: the derived `Ord` compares the class first.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PreRelease<'a> {
    class: char,
    number: Digits<'a>,
}

impl<'a> PreRelease<'a> {
    fn parse(tag: &'a str) -> Self {
        let (class, number) = [("alpha", 'a'), ("beta", 'b'), ("rc", 'c')]
            .iter()
            .find_map(|(long, class)| tag.strip_prefix(long).map(|rest| (*class, rest)))
            .unwrap_or_else(|| {
                let mut chars = tag.chars();
                let class = chars.next().unwrap_or('\0');
                (class, chars.as_str())
            });

        Self {
            class,
            number: Digits::parse(number),
        }
    }
}

/// Completes a possibly partial version against the available versions
///
/// - a version already in canonical form is returned as-is
/// - `latest` maps to `latest_stable`
/// - otherwise the highest stable version that has the input as a literal
///   prefix wins
/// - when nothing matches, the input comes back unchanged and must be
///   re-validated by the caller
pub fn complete_version<'a>(
    input: &str,
    available: impl IntoIterator<Item = &'a str>,
    latest_stable: &str,
) -> String {
    if input == LATEST_KEYWORD {
        return latest_stable.to_string();
    }

    let prefix = normalize(input);
    if is_canonical(&prefix) {
        return prefix;
    }

    available
        .into_iter()
        .filter(|v| !is_prerelease(v) && v.starts_with(prefix.as_str()))
        .max_by(|a, b| compare_versions(a, b))
        .map(str::to_string)
        .unwrap_or_else(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("v1.0.0", "v1.0.0", Ordering::Equal)]
    #[case("v2.0.0", "v1.0.0", Ordering::Greater)]
    #[case("v1.0.0", "v2.0.0", Ordering::Less)]
    #[case("v2.1.0", "v2.0.9", Ordering::Greater)]
    #[case("v2.0.10", "v2.0.9", Ordering::Greater)]
    #[case("v2.0.0", "v2.0.0.1", Ordering::Less)]
    #[case("2.0.0", "v2.0.0", Ordering::Equal)]
    // release vs pre-release
    #[case("v2.0.0", "v2.0.0-a1", Ordering::Greater)]
    #[case("v2.0.0", "v2.0.0-b1", Ordering::Greater)]
    #[case("v2.0.0", "v2.0.0-c1", Ordering::Greater)]
    #[case("v2.0.0", "v2.0.0-rc1", Ordering::Greater)]
    // tiers
    #[case("v2.0.0-a1", "v2.0.0-b1", Ordering::Less)]
    #[case("v2.0.0-b1", "v2.0.0-c1", Ordering::Less)]
    #[case("v2.0.0-a1", "v2.0.0-c1", Ordering::Less)]
    // numbers within a tier
    #[case("v2.0.0-a1", "v2.0.0-a2", Ordering::Less)]
    #[case("v2.0.0-b1", "v2.0.0-b2", Ordering::Less)]
    #[case("v2.0.0-c2", "v2.0.0-c10", Ordering::Less)]
    // pre-release across main versions
    #[case("v2.0.0-c1", "v2.0.1", Ordering::Less)]
    #[case("v2.0.0-b1", "v2.0.1-a1", Ordering::Less)]
    // long tag names share the single-letter class
    #[case("v2.0.0-alpha1", "v2.0.0-b1", Ordering::Less)]
    #[case("v2.0.0-beta1", "v2.0.0-rc1", Ordering::Less)]
    #[case("v2.0.0-a1", "v2.0.0-rc1", Ordering::Less)]
    #[case("v2.0.0-alpha3", "v2.0.0-a3", Ordering::Equal)]
    #[case("v2.0.0-rc2", "v2.0.0-c2", Ordering::Equal)]
    // components beyond the range of u64
    #[case("v99999999999999999999.0.0", "v1.0.0", Ordering::Greater)]
    #[case("v99999999999999999999.0.0", "v99999999999999999998.0.0", Ordering::Greater)]
    #[case("v1.0.0-rc99999999999999999999", "v1.0.0-rc2", Ordering::Greater)]
    #[case("v1.007.0", "v1.7.0", Ordering::Equal)]
    #[case("v1.0.0", "v1.00.0", Ordering::Equal)]
    fn compare_versions_returns_expected(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(left, right), expected);
        assert_eq!(compare_versions(right, left), expected.reverse());
    }

    #[test]
    fn compare_versions_is_transitive_over_sample() {
        let versions = [
            "v0.9.0",
            "v1.0.0-a1",
            "v1.0.0-alpha2",
            "v1.0.0-b1",
            "v1.0.0-rc1",
            "v1.0.0",
            "v1.0.1",
            "v1.10.0",
            "v2.0.0-c3",
            "v2.0.0",
        ];

        for a in versions {
            assert_eq!(compare_versions(a, a), Ordering::Equal);
            for b in versions {
                for c in versions {
                    if compare_versions(a, b).is_le() && compare_versions(b, c).is_le() {
                        assert!(compare_versions(a, c).is_le(), "{a} <= {b} <= {c}");
                    }
                }
            }
        }

        let mut sorted = versions.to_vec();
        sorted.reverse();
        sorted.sort_by(|a, b| compare_versions(a, b));
        assert_eq!(sorted, versions.to_vec());
    }

    const AVAILABLE: &[&str] = &[
        "v2.7.0", "v2.1.0-b1", "v2.0.2", "v2.0.1", "v2.0.0", "v1.5.1", "v1.0.0",
    ];

    #[rstest]
    #[case("v1.0.0", "v1.0.0")]
    #[case("v2.0.0", "v2.0.0")]
    #[case("v1", "v1.5.1")]
    #[case("v1.0", "v1.0.0")]
    #[case("v2", "v2.7.0")]
    #[case("v2.0", "v2.0.2")]
    #[case("1.0.0", "v1.0.0")]
    #[case("2", "v2.7.0")]
    #[case("v9.9.9", "v9.9.9")]
    #[case("v4", "v4")]
    #[case("nonsense", "nonsense")]
    #[case("latest", "v2.7.0")]
    fn complete_version_returns_expected(#[case] input: &str, #[case] expected: &str) {
        let completed = complete_version(input, AVAILABLE.iter().copied(), "v2.7.0");

        assert_eq!(completed, expected);
    }

    #[test]
    fn complete_version_ignores_prereleases() {
        let completed = complete_version("v2.1", ["v2.1.0-b1", "v2.1.0-rc1"], "v2.0.0");

        assert_eq!(completed, "v2.1");
    }
}
