//! Image reference helpers

use nexus_common::crd::PullPolicy;

/// Pull policy Kubernetes would pick for `image` when none is given.
///
/// A reference pinned by digest or by a tag other than `latest` is pulled
/// only when missing; untagged and `latest` references are always pulled.
pub fn infer_pull_policy(image: &str) -> PullPolicy {
    if image.contains('@') {
        return PullPolicy::IfNotPresent;
    }

    // A ':' before the last '/' belongs to a registry port, not a tag.
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    match last_segment.split_once(':') {
        Some((_, tag)) if !tag.is_empty() && tag != "latest" => PullPolicy::IfNotPresent,
        _ => PullPolicy::Always,
    }
}

/// The explicit policy if set, otherwise the inferred one
pub fn effective_pull_policy(explicit: Option<PullPolicy>, image: &str) -> PullPolicy {
    explicit.unwrap_or_else(|| infer_pull_policy(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_images_are_always_pulled() {
        assert_eq!(infer_pull_policy("repo/img"), PullPolicy::Always);
        assert_eq!(infer_pull_policy("nexus3"), PullPolicy::Always);
    }

    #[test]
    fn latest_is_always_pulled() {
        assert_eq!(infer_pull_policy("repo/img:latest"), PullPolicy::Always);
        assert_eq!(
            infer_pull_policy("docker.io/sonatype/nexus3:latest"),
            PullPolicy::Always
        );
    }

    #[test]
    fn pinned_tags_are_pulled_if_missing() {
        assert_eq!(infer_pull_policy("repo/img:1.0"), PullPolicy::IfNotPresent);
        assert_eq!(
            infer_pull_policy("docker.io/sonatype/nexus3:3.70.1"),
            PullPolicy::IfNotPresent
        );
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        assert_eq!(infer_pull_policy("localhost:5000/img"), PullPolicy::Always);
        assert_eq!(
            infer_pull_policy("localhost:5000/img:2.1"),
            PullPolicy::IfNotPresent
        );
    }

    #[test]
    fn digests_count_as_pinned() {
        assert_eq!(
            infer_pull_policy("repo/img@sha256:0123456789abcdef"),
            PullPolicy::IfNotPresent
        );
    }

    #[test]
    fn explicit_policy_overrides_inference() {
        assert_eq!(
            effective_pull_policy(Some(PullPolicy::Never), "repo/img"),
            PullPolicy::Never
        );
        assert_eq!(
            effective_pull_policy(Some(PullPolicy::Always), "repo/img:1.0"),
            PullPolicy::Always
        );
        assert_eq!(effective_pull_policy(None, "repo/img:1.0"), PullPolicy::IfNotPresent);
    }
}
