//! Positional relations between two spans.
//!
//! Every predicate reads `pred(x, y)` as "y is <relation> with respect to x".
//! These are the only geometric tests used by the grammar engine and the conflict
//! resolver.
//!
//! ```text
//! touching_right    hovering_right    nested           overlapping_right
//! xxxxxxxx          xxxxxxxx          xxxxxxxx         xxxxxxxx
//!         yyyyy               yyyyy     yyyyy                yyyyy
//! ```

use crate::span::Bounded;

/// `y` starts exactly where `x` ends.
pub fn touching_right<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    x.end() == y.start()
}

/// `y` ends exactly where `x` starts.
pub fn touching_left<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    touching_right(y, x)
}

/// `y` starts strictly after `x` ends.
pub fn hovering_right<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    x.end() < y.start()
}

/// `y` ends strictly before `x` starts.
pub fn hovering_left<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    hovering_right(y, x)
}

/// `y` is touching or hovering on the right of `x`.
pub fn right<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    touching_right(x, y) || hovering_right(x, y)
}

/// `y` is touching or hovering on the left of `x`.
pub fn left<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    right(y, x)
}

/// `y` lies inside `x`, boundaries inclusive.
pub fn nested<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    x.start() <= y.start() && y.start() <= y.end() && y.end() <= x.end()
}

/// Both spans cover the same interval.
pub fn equal<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    nested(x, y) && nested(y, x)
}

/// `y` is nested in `x` and shares its right end.
pub fn nested_aligned_right<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    nested(x, y) && x.end() == y.end()
}

/// `y` is nested in `x` and shares its left end.
pub fn nested_aligned_left<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    nested(x, y) && x.start() == y.start()
}

/// The left edge of `x` falls strictly inside `y`.
pub fn overlapping_left<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    y.start() < x.start() && x.start() < y.end()
}

/// The right edge of `x` falls strictly inside `y`.
pub fn overlapping_right<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    y.start() < x.end() && x.end() < y.end()
}

/// One span nests in the other, or they partially overlap.
///
/// Symmetric. Spans that only touch or are disjoint never conflict.
pub fn conflict<X: Bounded + ?Sized, Y: Bounded + ?Sized>(x: &X, y: &Y) -> bool {
    nested(x, y) || nested(y, x) || overlapping_left(x, y) || overlapping_right(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn s(start: usize, end: usize) -> Span {
        Span::new(start, end).unwrap()
    }

    /// Every span with offsets in `0..=limit`, empty ones included.
    fn all_spans(limit: usize) -> Vec<Span> {
        let mut spans = Vec::new();
        for start in 0..=limit {
            for end in start..=limit {
                spans.push(s(start, end));
            }
        }
        spans
    }

    #[test]
    fn conflict_is_symmetric() {
        let spans = all_spans(6);
        for x in &spans {
            for y in &spans {
                assert_eq!(conflict(x, y), conflict(y, x), "x={} y={}", x, y);
            }
        }
    }

    #[test]
    fn equal_iff_mutually_nested() {
        let spans = all_spans(5);
        for x in &spans {
            for y in &spans {
                assert_eq!(nested(x, y) && nested(y, x), equal(x, y));
                assert_eq!(equal(x, y), x == y);
            }
        }
    }

    #[test]
    fn touching_and_hovering_never_conflict() {
        let spans = all_spans(6);
        for x in spans.iter().filter(|x| !x.is_empty()) {
            for y in spans.iter().filter(|y| !y.is_empty()) {
                if right(x, y) || left(x, y) {
                    assert!(!conflict(x, y), "x={} y={}", x, y);
                }
            }
        }
    }

    #[test]
    fn pictorial_cases() {
        let x = s(0, 8);

        assert!(touching_right(&x, &s(8, 13)));
        assert!(touching_left(&s(5, 13), &s(0, 5)));
        assert!(hovering_right(&x, &s(10, 15)));
        assert!(hovering_left(&s(10, 15), &x));
        assert!(right(&x, &s(8, 9)) && right(&x, &s(9, 10)));
        assert!(!right(&x, &s(7, 9)));

        assert!(nested(&x, &s(2, 7)));
        assert!(nested_aligned_right(&x, &s(3, 8)));
        assert!(!nested_aligned_right(&x, &s(3, 7)));
        assert!(nested_aligned_left(&x, &s(0, 5)));
        assert!(!nested_aligned_left(&x, &s(1, 5)));

        assert!(overlapping_left(&s(2, 10), &s(0, 5)));
        assert!(overlapping_right(&x, &s(6, 11)));
        assert!(!overlapping_right(&x, &s(8, 11)));
    }

    #[test]
    fn conflict_cases() {
        // partial overlap from the right
        assert!(conflict(&s(0, 5), &s(3, 8)));
        // nesting either way
        assert!(conflict(&s(0, 10), &s(2, 4)));
        assert!(conflict(&s(2, 4), &s(0, 10)));
        // identical
        assert!(conflict(&s(1, 4), &s(1, 4)));
        // touching
        assert!(!conflict(&s(3, 8), &s(8, 12)));
        // disjoint
        assert!(!conflict(&s(0, 5), &s(8, 12)));
    }
}
