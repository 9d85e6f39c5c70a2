//! Tests for the git module.

use super::*;

mod role_source_tests {
    use super::*;

    #[test]
    fn parse_https_git_url() {
        let source = RoleSource::parse("https://github.com/acme/ansible-role-nginx.git", None).unwrap();
        assert_eq!(source.url, "https://github.com/acme/ansible-role-nginx.git");
        assert_eq!(source.kind, SourceKind::Git);
        assert_eq!(source.version, None);
        assert_eq!(source.derived_name(), "ansible-role-nginx");
    }

    #[test]
    fn parse_git_prefix_with_version_and_name() {
        let source = RoleSource::parse("git+https://git.example.com/roles/base,v1.2.0,acme_base", None)
            .unwrap();
        assert_eq!(source.url, "https://git.example.com/roles/base");
        assert!(source.is_git());
        assert_eq!(source.version.as_deref(), Some("v1.2.0"));
        assert_eq!(source.derived_name(), "acme_base");
    }

    #[test]
    fn parse_github_shorthand() {
        let source = RoleSource::parse("github:acme/ansible-role-db", None).unwrap();
        assert_eq!(source.url, "https://github.com/acme/ansible-role-db");
        assert!(source.is_git());
        assert_eq!(source.derived_name(), "ansible-role-db");
    }

    #[test]
    fn parse_invalid_github_shorthand() {
        assert!(RoleSource::parse("github:acme", None).is_err());
        assert!(RoleSource::parse("github:acme/", None).is_err());
    }

    #[test]
    fn parse_ssh_url() {
        let source = RoleSource::parse("git@github.com:acme/base.git", None).unwrap();
        assert!(source.is_git());
        assert_eq!(source.derived_name(), "base");
    }

    #[test]
    fn parse_scm_overrides_heuristics() {
        let source = RoleSource::parse("https://git.example.com/roles/web", Some("git")).unwrap();
        assert!(source.is_git());
        assert!(RoleSource::parse("https://hg.example.com/roles/web", Some("hg")).is_err());
    }

    #[test]
    fn parse_archive_url() {
        let source = RoleSource::parse("https://downloads.example.com/roles/web-1.0.tar.gz", None)
            .unwrap();
        assert_eq!(source.kind, SourceKind::Archive);
        assert_eq!(source.derived_name(), "web-1.0");
    }

    #[test]
    fn parse_galaxy_name() {
        let source = RoleSource::parse("geerlingguy.java,2.4.0", None).unwrap();
        assert_eq!(source.kind, SourceKind::Galaxy);
        assert_eq!(source.url, "geerlingguy.java");
        assert_eq!(source.version.as_deref(), Some("2.4.0"));
        assert_eq!(source.derived_name(), "geerlingguy.java");
    }

    #[test]
    fn parse_empty_src() {
        assert!(RoleSource::parse("  ", None).is_err());
        assert!(RoleSource::parse(",v1", None).is_err());
    }
}
