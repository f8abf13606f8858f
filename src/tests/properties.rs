use crate::grammar::{EvalCache, Grammar, KeepAll, MaximalCoverage, SymbolId};
use crate::span_ops::equal;
use crate::{Annotation, Bounded, Layer, Span, Text};

const SOURCE: &str = "abcdefghijklmnop";

fn layer(name: &str, spans: &[(usize, usize)]) -> Layer {
    let mut layer = Layer::new(name);
    for &(start, end) in spans {
        layer
            .add_span(Span::new(start, end).unwrap(), Annotation::new())
            .unwrap();
    }
    layer
}

fn text_with(layers: Vec<(&str, Vec<(usize, usize)>)>) -> Text {
    let mut text = Text::new(SOURCE);
    for (name, spans) in layers {
        text.add_layer(layer(name, &spans)).unwrap();
    }
    text
}

fn raw(grammar: &Grammar, root: SymbolId, text: &Text) -> Vec<(usize, usize)> {
    grammar
        .get_matches(root, text, &KeepAll)
        .unwrap()
        .iter()
        .map(|m| m.bounds())
        .collect()
}

#[test]
fn union_output_is_sorted_whatever_the_child_order() {
    let text = text_with(vec![("late", vec![(6, 9), (1, 2)]), ("early", vec![(0, 4), (5, 7)])]);
    let mut grammar = Grammar::new();
    let late = grammar.layer("late", None).unwrap();
    let early = grammar.layer("early", None).unwrap();
    let forward = grammar.union(&[early, late], None).unwrap();
    let backward = grammar.union(&[late, early], None).unwrap();

    let expected = vec![(0, 4), (1, 2), (5, 7), (6, 9)];
    assert_eq!(raw(&grammar, forward, &text), expected);
    assert_eq!(raw(&grammar, backward, &text), expected);
}

#[test]
fn union_retags_only_when_named() {
    let text = text_with(vec![("a", vec![(0, 2)]), ("b", vec![(3, 5)])]);
    let mut grammar = Grammar::new();
    let a = grammar.layer("a", Some("first")).unwrap();
    let b = grammar.layer("b", None).unwrap();
    let plain = grammar.union(&[a, b], None).unwrap();
    let named = grammar.union(&[a, b], Some("either")).unwrap();

    let names = |root| -> Vec<Option<String>> {
        grammar
            .get_matches(root, &text, &KeepAll)
            .unwrap()
            .iter()
            .map(|m| m.name().map(str::to_string))
            .collect()
    };
    assert_eq!(names(plain), vec![Some("first".to_string()), None]);
    assert_eq!(
        names(named),
        vec![Some("either".to_string()), Some("either".to_string())]
    );
}

#[test]
fn concatenation_merges_touching_matches_only() {
    let text = text_with(vec![("a", vec![(0, 2)]), ("b", vec![(2, 5), (6, 9)])]);
    let mut grammar = Grammar::new();
    let a = grammar.layer("a", None).unwrap();
    let b = grammar.layer("b", None).unwrap();
    let ab = grammar.concatenation(&[a, b], None).unwrap();

    assert_eq!(raw(&grammar, ab, &text), vec![(0, 5)]);
}

#[test]
fn concatenation_folds_left_to_right() {
    let text = text_with(vec![
        ("a", vec![(0, 2), (7, 8)]),
        ("b", vec![(2, 3), (8, 10)]),
        ("c", vec![(3, 6), (10, 11)]),
    ]);
    let mut grammar = Grammar::new();
    let a = grammar.layer("a", None).unwrap();
    let b = grammar.layer("b", None).unwrap();
    let c = grammar.layer("c", None).unwrap();
    let abc = grammar.concatenation(&[a, b, c], None).unwrap();

    assert_eq!(raw(&grammar, abc, &text), vec![(0, 6), (7, 11)]);
}

#[test]
fn gaps_are_greedy_and_all_gaps_exhaustive() {
    let text = text_with(vec![("a", vec![(0, 2)]), ("b", vec![(4, 6), (7, 9)])]);
    let mut grammar = Grammar::new();
    let a = grammar.layer("a", None).unwrap();
    let b = grammar.layer("b", None).unwrap();
    let nearest = grammar.gaps(&[a, b], None).unwrap();
    let every = grammar.all_gaps(&[a, b], None).unwrap();

    assert_eq!(raw(&grammar, nearest, &text), vec![(0, 6)]);
    assert_eq!(raw(&grammar, every, &text), vec![(0, 6), (0, 9)]);
}

#[test]
fn resolver_prefers_earlier_input_on_equal_coverage() {
    let text = text_with(vec![("x", vec![(0, 5)]), ("y", vec![(3, 8)]), ("z", vec![(8, 12)])]);
    let mut grammar = Grammar::new();
    let x = grammar.layer("x", Some("x")).unwrap();
    let y = grammar.layer("y", Some("y")).unwrap();
    let z = grammar.layer("z", Some("z")).unwrap();
    let any = grammar.union(&[x, y, z], None).unwrap();

    let resolved = grammar.get_matches(any, &text, &MaximalCoverage).unwrap();
    let names: Vec<_> = resolved.iter().filter_map(|m| m.name()).collect();
    assert_eq!(names, vec!["x", "z"]);
}

#[test]
fn shared_symbols_are_evaluated_once_per_pass() {
    let text = text_with(vec![("a", vec![(0, 2)]), ("b", vec![(2, 4)])]);
    let mut grammar = Grammar::new();
    let shared = grammar.layer("a", None).unwrap();
    let twin = grammar.layer("a", None).unwrap();
    let b = grammar.layer("b", None).unwrap();
    let left = grammar.concatenation(&[shared, b], None).unwrap();
    let right = grammar.gaps(&[shared, b], None).unwrap();
    let root = grammar.union(&[left, right, twin], None).unwrap();

    let mut cache = EvalCache::new();
    grammar.evaluate(root, &text, &mut cache).unwrap();
    assert_eq!(cache.evaluations(shared), 1);
    assert_eq!(cache.evaluations(twin), 1);
    assert_eq!(cache.evaluations(b), 1);
    assert_eq!(cache.get(root).unwrap().len(), 3);

    // a new pass starts from scratch
    let mut fresh = EvalCache::new();
    grammar.evaluate(left, &text, &mut fresh).unwrap();
    assert_eq!(fresh.evaluations(shared), 1);
    assert_eq!(fresh.evaluations(twin), 0);
}

#[test]
fn attached_spans_read_back_in_order() {
    let written = [(6, 9), (0, 2), (2, 5), (2, 3)];
    let text = text_with(vec![("written", written.to_vec())]);

    let mut expected: Vec<Span> = written
        .iter()
        .map(|&(s, e)| Span::new(s, e).unwrap())
        .collect();
    expected.sort();
    let read = text.spans("written").unwrap();
    assert_eq!(read.len(), expected.len());
    for (r, e) in read.iter().zip(&expected) {
        assert!(equal(r, e));
    }
}
