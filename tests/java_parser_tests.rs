use faultline::core::types::{ComponentKind, Granularity, Identity};
use faultline::parsing::{JavaParser, SourceParser};
use indoc::indoc;

const API_SOURCE: &str = indoc! {"
    public class API {
        public boolean login(String email, String password) {
            return true;
        }

        public boolean login(String token) {
            return false;
        }

        public void logout() {
            clearSession();
        }
    }
"};

fn parse(source: &str, granularity: Granularity) -> faultline::Component {
    let mut parser = JavaParser::new().unwrap();
    parser.parse("API.java", source, granularity).unwrap()
}

#[test]
fn parses_classes_and_methods_with_parameter_types() {
    let file = parse(API_SOURCE, Granularity::Method);
    assert_eq!(file.kind, ComponentKind::File);
    assert_eq!(file.identity, Identity::file("API.java"));

    let classes = file.components_of(ComponentKind::Class);
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].name, "API");
    assert_eq!(classes[0].identity, Identity::file("API.java").child("API"));

    let methods: Vec<&str> = file
        .components_of(ComponentKind::Method)
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(
        methods,
        vec!["login(String,String)", "login(String)", "logout()"]
    );
}

#[test]
fn overloads_have_distinct_identities() {
    let file = parse(API_SOURCE, Granularity::Method);
    let identities: Vec<String> = file
        .components_of(ComponentKind::Method)
        .iter()
        .map(|m| m.identity.to_string())
        .collect();
    assert!(identities.contains(&"API.java.API.login(String,String)".to_string()));
    assert!(identities.contains(&"API.java.API.login(String)".to_string()));
}

#[test]
fn nested_classes_carry_the_ancestor_chain() {
    let source = indoc! {"
        public class Outer {
            class Inner {
                void go(int depth) {
                }
            }
        }
    "};
    let mut parser = JavaParser::new().unwrap();
    let file = parser.parse("Outer.java", source, Granularity::Method).unwrap();

    let classes: Vec<String> = file
        .components_of(ComponentKind::Class)
        .iter()
        .map(|c| c.identity.to_string())
        .collect();
    assert_eq!(classes, vec!["Outer.java.Outer", "Outer.java.Outer.Inner"]);

    let methods: Vec<String> = file
        .components_of(ComponentKind::Method)
        .iter()
        .map(|m| m.identity.to_string())
        .collect();
    assert_eq!(methods, vec!["Outer.java.Outer.Inner.go(int)"]);
}

#[test]
fn anonymous_classes_get_synthetic_scoped_identities() {
    let source = indoc! {"
        public class A {
            void run() {
                Runnable first = new Runnable() {
                    public void run() {
                    }
                };
                Runnable second = new Runnable() {
                    public void run() {
                    }
                };
            }
        }
    "};
    let mut parser = JavaParser::new().unwrap();
    let file = parser.parse("A.java", source, Granularity::Method).unwrap();

    let classes: Vec<String> = file
        .components_of(ComponentKind::Class)
        .iter()
        .map(|c| c.identity.to_string())
        .collect();
    assert!(classes.contains(&"A.java.A.run().N$1".to_string()));
    assert!(classes.contains(&"A.java.A.run().N$2".to_string()));

    let methods: Vec<String> = file
        .components_of(ComponentKind::Method)
        .iter()
        .map(|m| m.identity.to_string())
        .collect();
    assert!(methods.contains(&"A.java.A.run().N$1.run()".to_string()));
}

#[test]
fn granularity_caps_extraction_depth() {
    let file_only = parse(API_SOURCE, Granularity::File);
    assert!(file_only.children.is_empty());

    let class_only = parse(API_SOURCE, Granularity::Class);
    assert_eq!(class_only.components_of(ComponentKind::Class).len(), 1);
    assert!(class_only.components_of(ComponentKind::Method).is_empty());

    let methods = parse(API_SOURCE, Granularity::Method);
    assert!(methods.components_of(ComponentKind::Line).is_empty());
    assert_eq!(methods.components_of(ComponentKind::Method).len(), 3);
}

#[test]
fn line_granularity_tracks_declaration_and_statement_lines() {
    let file = parse(API_SOURCE, Granularity::Line);
    let lines = file.components_of(ComponentKind::Line);
    assert!(!lines.is_empty());

    // The first login method is declared on line 2 and returns on line 3
    let login = file
        .components_of(ComponentKind::Method)
        .into_iter()
        .find(|m| m.name == "login(String,String)")
        .unwrap()
        .clone();
    let line_names: Vec<&str> = login
        .children
        .iter()
        .filter(|c| c.kind == ComponentKind::Line)
        .map(|c| c.name.as_str())
        .collect();
    assert!(line_names.contains(&"2"));
    assert!(line_names.contains(&"3"));
}

#[test]
fn component_ranges_nest_within_their_parents() {
    let file = parse(API_SOURCE, Granularity::Line);
    fn check(component: &faultline::Component) {
        for child in &component.children {
            assert!(
                child.start_line >= component.start_line
                    && child.end_line <= component.end_line,
                "{} [{}, {}] escapes {} [{}, {}]",
                child.identity,
                child.start_line,
                child.end_line,
                component.identity,
                component.start_line,
                component.end_line
            );
            check(child);
        }
    }
    check(&file);
}

#[test]
fn parsing_is_deterministic() {
    let first = parse(API_SOURCE, Granularity::Line);
    let second = parse(API_SOURCE, Granularity::Line);
    assert_eq!(first, second);
}

#[test]
fn invalid_source_fails_with_a_parse_error() {
    let mut parser = JavaParser::new().unwrap();
    let result = parser.parse("Broken.java", "public class {", Granularity::Method);
    assert!(matches!(
        result,
        Err(faultline::Error::Parse { .. })
    ));
}

#[test]
fn constructors_use_the_class_name() {
    let source = indoc! {"
        public class Point {
            private int x;

            public Point(int x) {
                this.x = x;
            }
        }
    "};
    let mut parser = JavaParser::new().unwrap();
    let file = parser.parse("Point.java", source, Granularity::Method).unwrap();
    let methods: Vec<&str> = file
        .components_of(ComponentKind::Method)
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(methods, vec!["Point(int)"]);
}
