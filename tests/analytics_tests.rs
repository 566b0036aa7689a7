use faultline::analytics::{FoldContext, RepositoryAnalytics};
use faultline::core::repository::{Commit, ComponentRef, Diff, Repository};
use faultline::core::types::{ComponentKind, FeatureWeights, Granularity, Identity};
use faultline::diff::structural_diff;
use indoc::indoc;

fn file_ref(path: &str) -> ComponentRef {
    ComponentRef::new(Identity::file(path), path)
}

fn class_ref(path: &str, class: &str) -> ComponentRef {
    ComponentRef::new(Identity::file(path).child(class), class)
}

fn method_ref(path: &str, class: &str, method: &str) -> ComponentRef {
    ComponentRef::new(Identity::file(path).child(class).child(method), method)
}

/// File + class + method Added diffs for a fresh file
fn added_file(path: &str, class: &str, methods: &[&str]) -> Vec<Diff> {
    let mut diffs = vec![Diff::added(ComponentKind::File, None, file_ref(path))];
    diffs.push(Diff::added(
        ComponentKind::Class,
        Some(Identity::file(path)),
        class_ref(path, class),
    ));
    for method in methods {
        diffs.push(Diff::added(
            ComponentKind::Method,
            Some(Identity::file(path).child(class)),
            method_ref(path, class, method),
        ));
    }
    diffs
}

fn modified_component(path: &str, class: &str, method: &str) -> Vec<Diff> {
    vec![
        Diff::modified(ComponentKind::File, None, file_ref(path), file_ref(path)),
        Diff::modified(
            ComponentKind::Class,
            Some(Identity::file(path)),
            class_ref(path, class),
            class_ref(path, class),
        ),
        Diff::modified(
            ComponentKind::Method,
            Some(Identity::file(path).child(class)),
            method_ref(path, class, method),
            method_ref(path, class, method),
        ),
    ]
}

#[test]
fn end_to_end_two_commit_scenario() {
    let commits = vec![
        Commit::new(
            "c1",
            "First commit",
            "alice@example.com",
            1_000,
            added_file("API.java", "API", &["login()", "logout()"]),
        ),
        Commit::new(
            "c2",
            "Fixed login bug",
            "bob@example.com",
            2_000,
            modified_component("API.java", "API", "login()"),
        ),
    ];
    let repository = Repository::new(commits).unwrap();
    let ctx = FoldContext::for_repository(&repository);
    let analytics = RepositoryAnalytics::analyze(&repository, &ctx);

    let file = analytics.find(&Identity::file("API.java")).unwrap();
    assert_eq!(file.metrics.revisions, 2);
    assert_eq!(file.metrics.fixes, 1);
    assert_eq!(file.metrics.authors.len(), 2);

    let login = analytics
        .find(&Identity::file("API.java").child("API").child("login()"))
        .unwrap();
    assert_eq!(login.metrics.revisions, 2);
    assert_eq!(login.metrics.fixes, 1);

    let logout = analytics
        .find(&Identity::file("API.java").child("API").child("logout()"))
        .unwrap();
    assert_eq!(logout.metrics.revisions, 1);
    assert_eq!(logout.metrics.fixes, 0);

    let weights = FeatureWeights::default();
    assert!(
        login.metrics.defect_probability(&weights) > logout.metrics.defect_probability(&weights),
        "the fixed method must outrank its untouched sibling"
    );
}

#[test]
fn rename_preserves_accumulated_metrics() {
    let rename = vec![Diff::renamed(
        ComponentKind::File,
        None,
        file_ref("API.java"),
        file_ref("Auth.java"),
    )];
    let commits = vec![
        Commit::new(
            "c1",
            "Fixed startup crash",
            "alice@example.com",
            1_000,
            added_file("API.java", "API", &["login()"]),
        ),
        Commit::new("c2", "Move API", "bob@example.com", 2_000, rename),
    ];
    let repository = Repository::new(commits).unwrap();
    let ctx = FoldContext::for_repository(&repository);
    let analytics = RepositoryAnalytics::analyze(&repository, &ctx);

    assert!(analytics.find(&Identity::file("API.java")).is_none());
    let renamed = analytics.find(&Identity::file("Auth.java")).unwrap();
    assert_eq!(renamed.metrics.revisions, 2);
    assert_eq!(renamed.metrics.fixes, 1);
    assert_eq!(renamed.metrics.authors.len(), 2);

    // Descendants survive under the rewritten prefix
    let login = analytics
        .find(&Identity::file("Auth.java").child("API").child("login()"))
        .unwrap();
    assert_eq!(login.metrics.revisions, 1);
}

#[test]
fn removal_purges_the_whole_subtree() {
    let commits = vec![
        Commit::new(
            "c1",
            "First commit",
            "alice@example.com",
            1_000,
            added_file("API.java", "API", &["login()", "logout()"]),
        ),
        Commit::new(
            "c2",
            "Drop the api",
            "alice@example.com",
            2_000,
            vec![Diff::removed(ComponentKind::File, None, file_ref("API.java"))],
        ),
    ];
    let repository = Repository::new(commits).unwrap();
    let ctx = FoldContext::for_repository(&repository);
    let analytics = RepositoryAnalytics::analyze(&repository, &ctx);

    assert!(analytics.is_empty());
    assert!(analytics.find(&Identity::file("API.java")).is_none());
    assert!(analytics
        .find(&Identity::file("API.java").child("API"))
        .is_none());
    assert!(analytics
        .find(&Identity::file("API.java").child("API").child("login()"))
        .is_none());
}

#[test]
fn removed_method_leaves_its_class_intact() {
    let commits = vec![
        Commit::new(
            "c1",
            "First commit",
            "alice@example.com",
            1_000,
            added_file("API.java", "API", &["login()", "logout()"]),
        ),
        Commit::new(
            "c2",
            "Remove logout",
            "alice@example.com",
            2_000,
            vec![Diff::removed(
                ComponentKind::Method,
                Some(Identity::file("API.java").child("API")),
                method_ref("API.java", "API", "logout()"),
            )],
        ),
    ];
    let repository = Repository::new(commits).unwrap();
    let ctx = FoldContext::for_repository(&repository);
    let analytics = RepositoryAnalytics::analyze(&repository, &ctx);

    assert!(analytics
        .find(&Identity::file("API.java").child("API").child("logout()"))
        .is_none());
    assert!(analytics
        .find(&Identity::file("API.java").child("API").child("login()"))
        .is_some());
    // Removal itself never updates metrics
    let class = analytics
        .find(&Identity::file("API.java").child("API"))
        .unwrap();
    assert_eq!(class.metrics.revisions, 1);
}

#[test]
fn snapshot_reports_the_whole_hierarchy() {
    let commits = vec![Commit::new(
        "c1",
        "First commit",
        "alice@example.com",
        1_000,
        added_file("API.java", "API", &["login()"]),
    )];
    let repository = Repository::new(commits).unwrap();
    let ctx = FoldContext::for_repository(&repository);
    let analytics = RepositoryAnalytics::analyze(&repository, &ctx);

    let weights = FeatureWeights::default();
    let report = analytics.snapshot(&weights, repository.commits.len());
    assert_eq!(report.commits, 1);
    assert_eq!(report.root.children.len(), 1);

    let file = &report.root.children[0];
    assert_eq!(file.name, "API.java");
    assert_eq!(file.path.as_deref(), Some("API.java"));
    assert_eq!(file.kind, Some("file"));
    assert_eq!(file.children.len(), 1);
    let class = &file.children[0];
    assert_eq!(class.name, "API");
    assert_eq!(class.children.len(), 1);
    assert!(class.prob >= 0.0 && class.prob < 1.0);
}

/// The same scenario as `end_to_end_two_commit_scenario`, with the diffs
/// produced by the structural engine instead of by hand
#[test]
fn engine_driven_fold_matches_the_scenario() {
    let version_1 = indoc! {"
        public class API {
            public boolean login(String email) {
                return true;
            }

            public void logout() {
                clearSession();
            }
        }
    "};
    let version_2 = version_1.replace("return true;", "return verify(email);");

    let mut diffs_c1 = vec![Diff::added(ComponentKind::File, None, file_ref("API.java"))];
    diffs_c1.extend(structural_diff(
        Granularity::Method,
        ("API.java", ""),
        ("API.java", version_1),
    ));
    let mut diffs_c2 = vec![Diff::modified(
        ComponentKind::File,
        None,
        file_ref("API.java"),
        file_ref("API.java"),
    )];
    diffs_c2.extend(structural_diff(
        Granularity::Method,
        ("API.java", version_1),
        ("API.java", &version_2),
    ));

    let commits = vec![
        Commit::new("c1", "First commit", "alice@example.com", 1_000, diffs_c1),
        Commit::new("c2", "Fixed login bug", "bob@example.com", 2_000, diffs_c2),
    ];
    let repository = Repository::new(commits).unwrap();
    let ctx = FoldContext::for_repository(&repository);
    let analytics = RepositoryAnalytics::analyze(&repository, &ctx);

    let login = analytics
        .find(
            &Identity::file("API.java")
                .child("API")
                .child("login(String)"),
        )
        .unwrap();
    assert_eq!(login.metrics.revisions, 2);
    assert_eq!(login.metrics.fixes, 1);

    let logout = analytics
        .find(&Identity::file("API.java").child("API").child("logout()"))
        .unwrap();
    assert_eq!(logout.metrics.revisions, 1);
    assert_eq!(logout.metrics.fixes, 0);
}
