//! Composable, lazy traversal expressions.
//!
//! An expression maps one input (usually an [`ObjectRef`]) to a lazy
//! sequence of outputs. Structural combinators take a continuation
//! expression and run it on every object they reach, so nesting reads
//! outside-in as a path through the graph:
//!
//! ```ignore
//! // objects two inbound hops away from `target`
//! let expr = inbound_lines(line_connected_from(inbound_lines(line_connected_from(identity()))));
//! let found: Vec<ObjectRef> = expr.eval(target).collect::<Result<_, _>>()?;
//! ```
//!
//! Expressions hold no diagram state. Nothing is walked until the returned
//! iterator is pulled, and each `eval` starts over from scratch. Items are
//! `Result`s: a dangling connection met mid-traversal shows up as an `Err`
//! item rather than being skipped.

use crate::diagram::{ObjectIter, ObjectRef, Objects};
use crate::error::DiaError;
use std::iter;

/// The lazy output of an expression.
pub type Seq<'a, T> = Box<dyn Iterator<Item = Result<T, DiaError>> + 'a>;

/// A reusable traversal from `I` to a sequence of `Self::Output`.
pub trait Expr<I> {
    type Output;

    fn eval<'a>(&'a self, input: I) -> Seq<'a, Self::Output>
    where
        I: 'a,
        Self::Output: 'a;
}

// ─── Primitives ──────────────────────────────────────────────────────────

/// Yields its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

pub fn identity() -> Identity {
    Identity
}

impl<I> Expr<I> for Identity {
    type Output = I;

    fn eval<'a>(&'a self, input: I) -> Seq<'a, I>
    where
        I: 'a,
    {
        Box::new(iter::once(Ok(input)))
    }
}

/// Yields its input if its type tag matches.
#[derive(Debug, Clone)]
pub struct HasType {
    type_name: String,
}

pub fn has_type(type_name: impl Into<String>) -> HasType {
    HasType {
        type_name: type_name.into(),
    }
}

impl<'d> Expr<ObjectRef<'d>> for HasType {
    type Output = ObjectRef<'d>;

    fn eval<'a>(&'a self, input: ObjectRef<'d>) -> Seq<'a, ObjectRef<'d>>
    where
        ObjectRef<'d>: 'a,
    {
        Box::new(
            iter::once(input)
                .filter(move |obj| obj.type_name() == self.type_name)
                .map(Ok),
        )
    }
}

/// Yields its input if its (marker-stripped) text matches.
#[derive(Debug, Clone)]
pub struct HasText {
    text: String,
}

pub fn has_text(text: impl Into<String>) -> HasText {
    HasText { text: text.into() }
}

impl<'d> Expr<ObjectRef<'d>> for HasText {
    type Output = ObjectRef<'d>;

    fn eval<'a>(&'a self, input: ObjectRef<'d>) -> Seq<'a, ObjectRef<'d>>
    where
        ObjectRef<'d>: 'a,
    {
        Box::new(
            iter::once(input)
                .filter(move |obj| obj.text() == Some(self.text.as_str()))
                .map(Ok),
        )
    }
}

// ─── Structural combinators ──────────────────────────────────────────────

/// Run `inner` on a resolved object, or pass a resolution error through.
fn continue_with<'a, 'd, E>(
    inner: &'a E,
    item: Result<ObjectRef<'d>, DiaError>,
) -> Seq<'a, E::Output>
where
    E: Expr<ObjectRef<'d>>,
    ObjectRef<'d>: 'a,
    E::Output: 'a,
{
    match item {
        Ok(obj) => inner.eval(obj),
        Err(err) => Box::new(iter::once(Err(err))),
    }
}

/// Runs `inner` on each line whose tail is attached to the input.
#[derive(Debug, Clone)]
pub struct OutboundLines<E> {
    inner: E,
}

pub fn outbound_lines<E>(inner: E) -> OutboundLines<E> {
    OutboundLines { inner }
}

impl<'d, E: Expr<ObjectRef<'d>>> Expr<ObjectRef<'d>> for OutboundLines<E> {
    type Output = E::Output;

    fn eval<'a>(&'a self, input: ObjectRef<'d>) -> Seq<'a, Self::Output>
    where
        ObjectRef<'d>: 'a,
        Self::Output: 'a,
    {
        Box::new(
            input
                .outbound_lines()
                .flat_map(move |line| continue_with(&self.inner, line)),
        )
    }
}

/// Runs `inner` on each line whose head is attached to the input.
#[derive(Debug, Clone)]
pub struct InboundLines<E> {
    inner: E,
}

pub fn inbound_lines<E>(inner: E) -> InboundLines<E> {
    InboundLines { inner }
}

impl<'d, E: Expr<ObjectRef<'d>>> Expr<ObjectRef<'d>> for InboundLines<E> {
    type Output = E::Output;

    fn eval<'a>(&'a self, input: ObjectRef<'d>) -> Seq<'a, Self::Output>
    where
        ObjectRef<'d>: 'a,
        Self::Output: 'a,
    {
        Box::new(
            input
                .inbound_lines()
                .flat_map(move |line| continue_with(&self.inner, line)),
        )
    }
}

/// Which end of a line `LineEnd` follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Head,
    Tail,
}

/// Runs `inner` on the object at one end of the input line. Non-lines and
/// unattached ends yield nothing.
#[derive(Debug, Clone)]
pub struct LineEnd<E> {
    end: End,
    inner: E,
}

/// Follow the input line to its head.
pub fn line_connected_to<E>(inner: E) -> LineEnd<E> {
    LineEnd {
        end: End::Head,
        inner,
    }
}

/// Follow the input line back to its tail.
pub fn line_connected_from<E>(inner: E) -> LineEnd<E> {
    LineEnd {
        end: End::Tail,
        inner,
    }
}

impl<'d, E: Expr<ObjectRef<'d>>> Expr<ObjectRef<'d>> for LineEnd<E> {
    type Output = E::Output;

    fn eval<'a>(&'a self, input: ObjectRef<'d>) -> Seq<'a, Self::Output>
    where
        ObjectRef<'d>: 'a,
        Self::Output: 'a,
    {
        // Resolution is deferred until the sequence is first pulled.
        Box::new(
            iter::once_with(move || -> Seq<'a, Self::Output> {
                let Ok(line) = input.as_line() else {
                    return Box::new(iter::empty());
                };
                let end = match self.end {
                    End::Head => line.connected_to(),
                    End::Tail => line.connected_from(),
                };
                match end.transpose() {
                    Some(obj) => continue_with(&self.inner, obj),
                    None => Box::new(iter::empty()),
                }
            })
            .flatten(),
        )
    }
}

/// Runs `inner` on every object with a connection to the input.
#[derive(Debug, Clone)]
pub struct ConnectedToThis<E> {
    inner: E,
}

pub fn connected_to_this<E>(inner: E) -> ConnectedToThis<E> {
    ConnectedToThis { inner }
}

impl<'d, E: Expr<ObjectRef<'d>>> Expr<ObjectRef<'d>> for ConnectedToThis<E> {
    type Output = E::Output;

    fn eval<'a>(&'a self, input: ObjectRef<'d>) -> Seq<'a, Self::Output>
    where
        ObjectRef<'d>: 'a,
        Self::Output: 'a,
    {
        Box::new(
            input
                .connected_to_this()
                .flat_map(move |other| continue_with(&self.inner, other)),
        )
    }
}

// ─── Shaping combinators ─────────────────────────────────────────────────

/// Pairs the input with each output of `inner`.
#[derive(Debug, Clone)]
pub struct Combine<E> {
    inner: E,
}

pub fn combine<E>(inner: E) -> Combine<E> {
    Combine { inner }
}

impl<I: Copy, E: Expr<I>> Expr<I> for Combine<E> {
    type Output = (I, E::Output);

    fn eval<'a>(&'a self, input: I) -> Seq<'a, Self::Output>
    where
        I: 'a,
        Self::Output: 'a,
    {
        Box::new(
            self.inner
                .eval(input)
                .map(move |item| item.map(|out| (input, out))),
        )
    }
}

/// Yields exactly one item: the first output of `inner`, or `None`.
#[derive(Debug, Clone)]
pub struct First<E> {
    inner: E,
}

pub fn first<E>(inner: E) -> First<E> {
    First { inner }
}

impl<I, E: Expr<I>> Expr<I> for First<E> {
    type Output = Option<E::Output>;

    fn eval<'a>(&'a self, input: I) -> Seq<'a, Self::Output>
    where
        I: 'a,
        Self::Output: 'a,
    {
        Box::new(iter::once_with(move || {
            self.inner.eval(input).next().transpose()
        }))
    }
}

/// Takes a sequence of inputs and concatenates `inner` over each, in order.
///
/// Implemented for the diagram's object iterators and for collected
/// `Vec`s of inputs.
#[derive(Debug, Clone)]
pub struct All<E> {
    inner: E,
}

pub fn all<E>(inner: E) -> All<E> {
    All { inner }
}

impl<'d, E: Expr<ObjectRef<'d>>> Expr<ObjectIter<'d>> for All<E> {
    type Output = E::Output;

    fn eval<'a>(&'a self, input: ObjectIter<'d>) -> Seq<'a, Self::Output>
    where
        ObjectIter<'d>: 'a,
        Self::Output: 'a,
    {
        Box::new(input.flat_map(move |obj| self.inner.eval(obj)))
    }
}

impl<'d, E: Expr<ObjectRef<'d>>> Expr<Objects<'d>> for All<E> {
    type Output = E::Output;

    fn eval<'a>(&'a self, input: Objects<'d>) -> Seq<'a, Self::Output>
    where
        Objects<'d>: 'a,
        Self::Output: 'a,
    {
        Box::new(input.iter().flat_map(move |obj| self.inner.eval(obj)))
    }
}

impl<T, E: Expr<T>> Expr<Vec<T>> for All<E> {
    type Output = E::Output;

    fn eval<'a>(&'a self, input: Vec<T>) -> Seq<'a, Self::Output>
    where
        Vec<T>: 'a,
        Self::Output: 'a,
    {
        Box::new(input.into_iter().flat_map(move |item| self.inner.eval(item)))
    }
}

/// Applies `f` to each output of `inner`; how scalars leave a traversal.
#[derive(Clone)]
pub struct Map<E, F> {
    inner: E,
    f: F,
}

pub fn map<E, F>(inner: E, f: F) -> Map<E, F> {
    Map { inner, f }
}

impl<I, E, F, T> Expr<I> for Map<E, F>
where
    E: Expr<I>,
    F: Fn(E::Output) -> T,
{
    type Output = T;

    fn eval<'a>(&'a self, input: I) -> Seq<'a, Self::Output>
    where
        I: 'a,
        Self::Output: 'a,
    {
        Box::new(
            self.inner
                .eval(input)
                .map(move |item| item.map(&self.f)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttrValue, AttributeMap, Point};
    use crate::diagram::Diagram;
    use crate::error::ErrorKind;
    use crate::line::CONN_ENDPOINTS;
    use crate::model::{Child, Connection, DiagramData, Layer, Object};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn obj(id: &str) -> Child {
        Object::new(id, "").into()
    }

    fn typed(id: &str, type_name: &str) -> Child {
        Object::new(id, type_name).into()
    }

    fn straight_line(id: &str, from: &str, to: &str) -> Child {
        let p = AttrValue::Point(Point { x: 0.0, y: 0.0 });
        Object::new(id, "Standard - Line")
            .with_attributes(
                AttributeMap::new().with(CONN_ENDPOINTS, AttrValue::List(vec![p.clone(), p])),
            )
            .with_connections([Connection::new(0, from), Connection::new(1, to)])
            .into()
    }

    fn diagram(children: Vec<Child>) -> Diagram {
        Diagram::new(DiagramData::default(), vec![Layer::new("L", children)]).unwrap()
    }

    fn id_set<'d>(items: impl IntoIterator<Item = ObjectRef<'d>>) -> HashSet<&'d str> {
        items.into_iter().map(|o| o.id().as_str()).collect()
    }

    fn collect<'a, T>(seq: Seq<'a, T>) -> Vec<T> {
        seq.collect::<Result<_, _>>().unwrap()
    }

    /// Lines 2→1, 3→1, 4→1, 5→4.
    fn fan_in() -> Diagram {
        diagram(vec![
            obj("1"),
            obj("2"),
            obj("3"),
            obj("4"),
            obj("5"),
            straight_line("l1", "2", "1"),
            straight_line("l2", "3", "1"),
            straight_line("l3", "4", "1"),
            straight_line("l4", "5", "4"),
        ])
    }

    #[test]
    fn identity_yields_input() {
        let d = fan_in();
        let one = d.objects().get("1").unwrap();
        assert_eq!(collect(identity().eval(one)), vec![one]);
    }

    #[test]
    fn outbound_lines_from_hub() {
        let d = diagram(vec![
            obj("1"),
            obj("2"),
            obj("3"),
            straight_line("a", "1", "2"),
            straight_line("b", "1", "3"),
        ]);
        let one = d.objects().get("1").unwrap();
        let lines = collect(outbound_lines(identity()).eval(one));
        assert_eq!(id_set(lines), HashSet::from(["a", "b"]));
    }

    #[test]
    fn line_connected_to_follows_head() {
        let d = diagram(vec![obj("1"), obj("2"), straight_line("l", "1", "2")]);
        let line = d.objects().get("l").unwrap();
        let found = collect(line_connected_to(identity()).eval(line));
        assert_eq!(id_set(found), HashSet::from(["2"]));

        let not_a_line = d.objects().get("1").unwrap();
        assert!(collect(line_connected_to(identity()).eval(not_a_line)).is_empty());
    }

    #[test]
    fn connected_to_this_includes_lines_and_plain_connections() {
        let d = fan_in();
        let one = d.objects().get("1").unwrap();
        let five = d.objects().get("5").unwrap();
        assert_eq!(
            id_set(collect(connected_to_this(identity()).eval(one))),
            HashSet::from(["l1", "l2", "l3"])
        );
        assert_eq!(
            id_set(collect(connected_to_this(identity()).eval(five))),
            HashSet::from(["l4"])
        );

        let d = diagram(vec![
            obj("1"),
            obj("2"),
            Object::new("3", "")
                .with_connection(Connection::new(0, "1"))
                .into(),
        ]);
        let one = d.objects().get("1").unwrap();
        let two = d.objects().get("2").unwrap();
        assert_eq!(
            id_set(collect(connected_to_this(identity()).eval(one))),
            HashSet::from(["3"])
        );
        assert!(collect(connected_to_this(identity()).eval(two)).is_empty());
    }

    #[test]
    fn has_type_and_has_text() {
        let d = diagram(vec![
            typed("1", "X"),
            typed("2", "Y"),
            Object::new("3", "X")
                .with_attributes(
                    AttributeMap::new().with("text", AttributeMap::new().with("string", "#Start#")),
                )
                .into(),
        ]);
        let [one, two, three] = ["1", "2", "3"].map(|id| d.objects().get(id).unwrap());

        assert_eq!(collect(has_type("X").eval(one)), vec![one]);
        assert!(collect(has_type("X").eval(two)).is_empty());
        assert_eq!(collect(has_text("Start").eval(three)), vec![three]);
        assert!(collect(has_text("Start").eval(one)).is_empty());
    }

    #[test]
    fn all_preserves_input_order() {
        let d = diagram(vec![typed("1", "X"), typed("2", "Y"), typed("3", "X")]);
        let expr = all(has_type("X"));
        let ids: Vec<&str> = collect(expr.eval(d.objects().iter()))
            .into_iter()
            .map(|o| o.id().as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn first_takes_first_match() {
        let d = diagram(vec![typed("1", "X"), typed("2", "Y"), typed("3", "X")]);
        let expr = first(all(has_type("X")));
        let out = collect(expr.eval(d.objects().iter()));
        assert_eq!(out, vec![Some(d.objects().get("1").unwrap())]);

        let none = first(all(has_type("Z")));
        assert_eq!(collect(none.eval(d.objects().iter())), vec![None]);
    }

    #[test]
    fn objects_via_lines() {
        let d = fan_in();
        let one = d.objects().get("1").unwrap();
        let expr = connected_to_this(line_connected_from(identity()));
        assert_eq!(
            id_set(collect(expr.eval(one))),
            HashSet::from(["2", "3", "4"])
        );
    }

    #[test]
    fn two_hops_inbound() {
        let d = fan_in();
        let one = d.objects().get("1").unwrap();
        let expr = inbound_lines(line_connected_from(inbound_lines(line_connected_from(
            identity(),
        ))));
        assert_eq!(collect(expr.eval(one)), vec![d.objects().get("5").unwrap()]);
    }

    #[test]
    fn combine_keeps_intermediate_node() {
        let d = diagram(vec![
            obj("1"),
            obj("2"),
            obj("3"),
            obj("4"),
            obj("5"),
            obj("6"),
            straight_line("l1", "2", "1"),
            straight_line("l2", "3", "1"),
            straight_line("l3", "4", "1"),
            straight_line("l4", "5", "4"),
            straight_line("l5", "6", "4"),
        ]);
        let one = d.objects().get("1").unwrap();
        let expr = inbound_lines(line_connected_from(combine(inbound_lines(
            line_connected_from(identity()),
        ))));
        let pairs: HashSet<(&str, &str)> = collect(expr.eval(one))
            .into_iter()
            .map(|(a, b)| (a.id().as_str(), b.id().as_str()))
            .collect();
        assert_eq!(pairs, HashSet::from([("4", "5"), ("4", "6")]));
    }

    #[test]
    fn combine_preserves_cardinality() {
        let d = fan_in();
        let one = d.objects().get("1").unwrap();
        let inner = inbound_lines(identity());
        let plain = collect(inner.eval(one)).len();
        let combined = collect(combine(inner).eval(one));
        assert_eq!(combined.len(), plain);
        assert!(combined.iter().all(|(x, _)| *x == one));
    }

    #[test]
    fn map_produces_scalars() {
        let d = fan_in();
        let one = d.objects().get("1").unwrap();
        let expr = map(inbound_lines(line_connected_from(identity())), |o: ObjectRef<'_>| {
            o.id().as_str()
        });
        let mut ids = collect(expr.eval(one));
        ids.sort_unstable();
        assert_eq!(ids, vec!["2", "3", "4"]);
    }

    #[test]
    fn evaluation_is_lazy_and_restartable() {
        let d = fan_in();
        let one = d.objects().get("1").unwrap();
        let expr = inbound_lines(line_connected_from(identity()));

        let mut seq = expr.eval(one);
        assert!(seq.next().is_some());
        drop(seq);

        let a = collect(expr.eval(one));
        let b = collect(expr.eval(one));
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn dangling_reference_surfaces_as_error() {
        let d = diagram(vec![obj("1"), straight_line("l", "ghost", "1")]);
        let one = d.objects().get("1").unwrap();
        let expr = inbound_lines(line_connected_from(identity()));
        let err = expr
            .eval(one)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
    }

    #[test]
    fn dangling_tail_fails_outbound_walks() {
        let d = diagram(vec![obj("A"), obj("B"), straight_line("l", "ghost", "B")]);
        let a = d.objects().get("A").unwrap();

        let heads = outbound_lines(line_connected_to(identity()));
        let err = heads.eval(a).collect::<Result<Vec<_>, _>>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);

        let sources = connected_to_this(identity());
        let err = sources.eval(a).collect::<Result<Vec<_>, _>>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
    }
}
