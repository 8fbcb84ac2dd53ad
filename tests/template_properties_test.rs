// Property Tests
// Randomized coverage for path-template matching, content negotiation,
// and the header map. Shapes that must hold for every input rather
// than a handful of examples.

use proptest::prelude::*;

use rusty_rest::http::HeaderMap;
use rusty_rest::negotiate::{negotiate, MediaType};
use rusty_rest::router::PathTemplate;

/// A template segment: literal text or a named parameter.
#[derive(Debug, Clone)]
enum Seg {
    Literal(String),
    Param(String),
}

fn seg_strategy() -> impl Strategy<Value = Seg> {
    prop_oneof![
        "[a-z][a-z0-9]{0,7}".prop_map(Seg::Literal),
        "[a-z][a-z0-9]{0,7}".prop_map(Seg::Param),
    ]
}

fn segs_strategy() -> impl Strategy<Value = Vec<Seg>> {
    prop::collection::vec(seg_strategy(), 1..6).prop_filter(
        "parameter names must be unique",
        |segs| {
            let mut names: Vec<&String> = segs
                .iter()
                .filter_map(|seg| match seg {
                    Seg::Param(name) => Some(name),
                    Seg::Literal(_) => None,
                })
                .collect();
            let before = names.len();
            names.sort_unstable();
            names.dedup();
            names.len() == before
        },
    )
}

fn raw_template(segs: &[Seg]) -> String {
    let mut raw = String::new();
    for seg in segs {
        raw.push('/');
        match seg {
            Seg::Literal(text) => raw.push_str(text),
            Seg::Param(name) => {
                raw.push('{');
                raw.push_str(name);
                raw.push('}');
            }
        }
    }
    raw
}

fn substituted_path(segs: &[Seg], values: &[String]) -> String {
    let mut path = String::new();
    let mut value_index = 0;
    for seg in segs {
        path.push('/');
        match seg {
            Seg::Literal(text) => path.push_str(text),
            Seg::Param(_) => {
                path.push_str(&values[value_index % values.len()]);
                value_index += 1;
            }
        }
    }
    path
}

proptest! {
    #[test]
    fn prop_template_matches_substituted_path(
        segs in segs_strategy(),
        values in prop::collection::vec("[a-z0-9]{1,8}", 1..6),
    ) {
        let template = PathTemplate::compile(&raw_template(&segs)).unwrap();
        let path = substituted_path(&segs, &values);

        let params = template.matches(&path).expect("substituted path must match");

        let mut value_index = 0;
        for seg in &segs {
            if let Seg::Param(name) = seg {
                let expected = &values[value_index % values.len()];
                prop_assert_eq!(params.get(name), Some(expected.as_str()));
                value_index += 1;
            }
        }
    }

    #[test]
    fn prop_trailing_slash_never_matches_bare(segs in segs_strategy()) {
        let raw = raw_template(&segs);
        let template = PathTemplate::compile(&raw).unwrap();
        let with_slash = format!("{}/", raw);

        // Parameterized templates match their own raw form only when
        // every segment is literal; the trailing-slash variant must
        // never match either way.
        prop_assert!(template.matches(&with_slash).is_none());
    }

    #[test]
    fn prop_extra_segment_never_matches(
        segs in segs_strategy(),
        values in prop::collection::vec("[a-z0-9]{1,8}", 1..6),
        extra in "[a-z0-9]{1,8}",
    ) {
        let template = PathTemplate::compile(&raw_template(&segs)).unwrap();
        let mut path = substituted_path(&segs, &values);
        path.push('/');
        path.push_str(&extra);

        prop_assert!(template.matches(&path).is_none());
    }

    #[test]
    fn prop_negotiation_picks_from_offers(
        accept in "[a-z]{1,6}/[a-z]{1,6}(;q=0\\.[0-9])?(, [a-z]{1,6}/[a-z]{1,6})*",
        offers in prop::collection::vec("[a-z]{1,6}/[a-z]{1,6}", 1..4),
    ) {
        let offered: Vec<MediaType> = offers
            .iter()
            .filter_map(|raw| MediaType::parse(raw))
            .collect();
        prop_assume!(!offered.is_empty());

        if let Some(picked) = negotiate(Some(&accept), &offered) {
            prop_assert!(offered.contains(&picked));
        }
    }

    #[test]
    fn prop_negotiation_missing_header_takes_first(
        offers in prop::collection::vec("[a-z]{1,6}/[a-z]{1,6}", 1..4),
    ) {
        let offered: Vec<MediaType> = offers
            .iter()
            .filter_map(|raw| MediaType::parse(raw))
            .collect();
        prop_assume!(!offered.is_empty());

        let picked = negotiate(None, &offered).expect("missing header accepts anything");
        prop_assert_eq!(picked, offered[0].clone());
    }

    #[test]
    fn prop_header_lookup_ignores_case(
        name in "[A-Za-z][A-Za-z-]{0,12}",
        values in prop::collection::vec("[ -~]{0,16}", 1..4),
    ) {
        let mut headers = HeaderMap::new();
        for value in &values {
            headers.append(&name, value.clone());
        }

        let upper = name.to_ascii_uppercase();
        let lower = name.to_ascii_lowercase();
        prop_assert_eq!(headers.get_all(&upper).len(), values.len());
        prop_assert_eq!(headers.get(&upper), headers.get(&lower));
        prop_assert_eq!(headers.get(&lower), Some(values[0].as_str()));
    }
}
