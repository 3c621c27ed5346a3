//! End-to-end chain resolution over on-disk fixtures.

use pretty_assertions::assert_eq;
use propchain_rs_config::{
    FetchError, MergedProperties, PropertiesResolver, ResolutionOptions, ResolveError, resolve,
    resolve_chain,
};
use propchain_rs_test_utils::{FailingFetcher, FixtureTree, RecordingFetcher, fixture_ambient};
use std::sync::Arc;

/// (root layer, grand-child layer) locations for every supported encoding and scheme.
fn cases(tree: &FixtureTree) -> Vec<(String, String)> {
    vec![
        (
            tree.classpath("just-properties.xml"),
            tree.classpath("grand-child-properties.xml"),
        ),
        (
            tree.classpath("just.properties"),
            tree.classpath("grand-child.properties"),
        ),
        (
            format!("file:{}", tree.path("just.properties").display()),
            format!("file:{}", tree.path("grand-child.properties").display()),
        ),
        (
            "conf/just.properties".to_string(),
            "conf/grand-child.properties".to_string(),
        ),
    ]
}

fn load(tree: &FixtureTree, location: &str) -> MergedProperties {
    resolve(
        location,
        &ResolutionOptions::default(),
        &tree.fetcher(),
        &fixture_ambient(),
    )
    .unwrap_or_else(|err| panic!("resolve {location}: {err}"))
}

#[test]
fn root_layer_resolves_against_ambient_only() {
    let tree = FixtureTree::new();
    for (just, _) in cases(&tree) {
        let props = load(&tree, &just);
        assert_eq!(props.get("member.name"), Some("KwonNam Son"));
        assert_eq!(props.get("member.email"), Some("kwon37xi@gmail.com"));
        assert_eq!(props.get("project.home"), Some("/tmp/propchain/project"));
        assert_eq!(props.len(), 7);
    }
}

#[test]
fn ancestors_contribute_keys() {
    let tree = FixtureTree::new();
    for (_, grand_child) in cases(&tree) {
        let props = load(&tree, &grand_child);
        assert_eq!(props.get("member.id"), Some("kwon37xi"));
        assert_eq!(props.get("member.name"), Some("KwonNam Son"));
        assert_eq!(props.get("project.name"), Some("Spring Properties Inheritance"));
    }
}

#[test]
fn nearest_layer_overrides() {
    let tree = FixtureTree::new();
    for (_, grand_child) in cases(&tree) {
        let props = load(&tree, &grand_child);
        assert_eq!(props.get("test.override"), Some("overridden"));
        assert_eq!(props.get("test.override.triple"), Some("overridden by grand child"));
    }
}

#[test]
fn extends_key_never_in_result() {
    let tree = FixtureTree::new();
    for (just, grand_child) in cases(&tree) {
        assert!(!load(&tree, &just).contains_key("__extends__"));
        assert!(!load(&tree, &grand_child).contains_key("__extends__"));
    }
}

#[test]
fn placeholders_read_ancestor_values() {
    let tree = FixtureTree::new();
    for (_, grand_child) in cases(&tree) {
        let props = load(&tree, &grand_child);
        assert_eq!(
            props.get("test.placeholder.parent"),
            Some("parent value/child value/grand child value")
        );
        assert_eq!(
            props.get("test.placeholder.grand_parent"),
            Some("grandparent/grandchild")
        );
        assert_eq!(
            props.get("test.placeholder.member.info"),
            Some("kwon37xi-KwonNam Son-kwon37xi@gmail.com-Spring Properties Inheritance")
        );
    }
}

#[test]
fn placeholders_fall_back_to_ambient() {
    let tree = FixtureTree::new();
    for (_, grand_child) in cases(&tree) {
        let props = load(&tree, &grand_child);
        assert_eq!(props.get("project.home"), Some("/tmp/propchain/project"));
        assert_eq!(
            props.get("test.placeholder.parent.system"),
            Some("/tmp/propchain/kwon37xi")
        );
    }
}

#[test]
fn ancestor_value_beats_ambient() {
    let tree = FixtureTree::new();
    for (_, grand_child) in cases(&tree) {
        let props = load(&tree, &grand_child);
        assert_eq!(
            props.get("test.placeholder.parent.override.system"),
            Some("KOREAN!!")
        );
    }
}

#[test]
fn parents_are_fetched_after_children_and_merged_root_first() {
    let tree = FixtureTree::new();
    let (fetcher, seen) = RecordingFetcher::new(tree.fetcher());
    let resolved = resolve_chain(
        &tree.classpath("grand-child.properties"),
        &ResolutionOptions::default(),
        &fetcher,
        &fixture_ambient(),
    )
    .expect("resolve");

    assert_eq!(
        *seen.lock(),
        vec![
            tree.classpath("grand-child.properties"),
            tree.classpath("child.properties"),
            tree.classpath("just.properties"),
        ]
    );
    assert_eq!(
        resolved.chain,
        vec![
            tree.classpath("just.properties"),
            tree.classpath("child.properties"),
            tree.classpath("grand-child.properties"),
        ]
    );
}

#[test]
fn repeated_runs_are_identical() {
    let tree = FixtureTree::new();
    let location = tree.classpath("grand-child-properties.xml");
    let first = load(&tree, &location);
    let second = load(&tree, &location);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("json"),
        serde_json::to_string(&second).expect("json")
    );
}

#[test]
fn text_and_xml_chains_agree() {
    let tree = FixtureTree::new();
    assert_eq!(
        load(&tree, &tree.classpath("grand-child.properties")),
        load(&tree, &tree.classpath("grand-child-properties.xml"))
    );
}

#[test]
fn shared_resolver_runs_concurrently() {
    let tree = FixtureTree::new();
    let resolver = PropertiesResolver::new(ResolutionOptions::default())
        .with_fetcher(Arc::new(tree.fetcher()))
        .with_ambient(Arc::new(fixture_ambient()));
    let location = tree.classpath("grand-child.properties");
    let expected = resolver.resolve(&location).expect("resolve");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| resolver.resolve(&location).expect("resolve")))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("join"), expected);
        }
    });
}

#[test]
fn xml_child_may_extend_text_parent() {
    let tree = FixtureTree::new();
    tree.write(
        "mixed.xml",
        r#"<properties>
    <entry key="__extends__">classpath:/conf/child.properties</entry>
    <entry key="summary">${member.id} on ${project.name}</entry>
</properties>"#,
    );
    let props = load(&tree, &tree.classpath("mixed.xml"));
    assert_eq!(
        props.get("summary"),
        Some("kwon37xi on Spring Properties Inheritance")
    );
}

#[test]
fn missing_ancestor_fails_whole_run() {
    let tree = FixtureTree::new();
    tree.write(
        "orphan.properties",
        "__extends__=classpath:/conf/nowhere.properties\na=1\n",
    );
    let err = resolve(
        &tree.classpath("orphan.properties"),
        &ResolutionOptions::default(),
        &tree.fetcher(),
        &fixture_ambient(),
    )
    .unwrap_err();
    match err {
        ResolveError::SourceUnavailable { location, source } => {
            assert_eq!(location, "classpath:/conf/nowhere.properties");
            assert!(matches!(source, FetchError::NotFound(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fetch_io_failure_is_source_unavailable() {
    let err = resolve(
        "anything.properties",
        &ResolutionOptions::default(),
        &FailingFetcher,
        &fixture_ambient(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::SourceUnavailable {
            source: FetchError::Io { .. },
            ..
        }
    ));
}

#[test]
fn cycle_is_detected_across_location_schemes() {
    let tree = FixtureTree::new();
    let b = tree.path("b.properties");
    tree.write(
        "a.properties",
        &format!("__extends__=file:{}\na=1\n", b.display()),
    );
    tree.write("b.properties", "__extends__=conf/a.properties\nb=2\n");

    let err = resolve(
        "conf/a.properties",
        &ResolutionOptions::default(),
        &tree.fetcher(),
        &fixture_ambient(),
    )
    .unwrap_err();
    match err {
        ResolveError::CyclicExtension { chain } => {
            assert_eq!(chain.len(), 3);
            assert_eq!(chain[0], "conf/a.properties");
            assert_eq!(chain[2], "conf/a.properties");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn lenient_mode_keeps_unknown_placeholders() {
    let tree = FixtureTree::new();
    tree.write(
        "lenient.properties",
        "__extends__=classpath:/conf/just.properties\nlog.dir=${LOG_ROOT}/${member.name}\n",
    );
    let options = ResolutionOptions::default().with_ignore_unresolvable(true);
    let props = resolve(
        &tree.classpath("lenient.properties"),
        &options,
        &tree.fetcher(),
        &fixture_ambient(),
    )
    .expect("resolve");
    assert_eq!(props.get("log.dir"), Some("${LOG_ROOT}/KwonNam Son"));
}
