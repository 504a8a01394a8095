//! Tree diffing.
//!
//! [`diff`] makes the element rendered for an old tree reflect a new tree,
//! reusing live elements where the shapes line up and rebuilding otherwise.
//! Children are matched strictly by position.

mod props;

pub use props::PropDelta;

use crate::component::Instance;
use crate::error::{PivotError, Result};
use crate::runtime::Runtime;
use crate::surface::ElementId;
use crate::vnode::{attach_child, Child, Children, VNode};
use smallvec::SmallVec;
use tracing::debug;

type Owners = SmallVec<[Instance; 4]>;

/// Reconcile the live element of `old` with `neo`.
///
/// Equal tags with declarative children are patched in place and `neo` takes
/// over `old`'s element. Otherwise `neo` gets a fresh element placed where
/// `old`'s element was. `scope` receives `ref` registrations when `neo` is not
/// itself a component root.
pub fn diff(rt: &Runtime, old: &VNode, neo: &VNode, scope: Option<&Instance>) -> Result<()> {
    let old = &live_node(old);
    if old.ptr_eq(neo) {
        // e.g. a child instance that already re-rendered itself
        return Ok(());
    }
    let el = old
        .handle()
        .ok_or_else(|| PivotError::NotMounted(old.tag().into()))?;
    if neo.handle() == Some(el) {
        return Ok(());
    }

    let old_owner = old.owner();
    let neo_owner = neo.owner();
    let scope = neo_owner.as_ref().or(scope);

    if old.tag() != neo.tag() {
        return renew(rt, old, el, neo, scope);
    }

    if old.children().has_foreign() || neo.children().has_foreign() {
        return renew(rt, old, el, neo, scope);
    }

    // Element `neo` was pre-rendered into (a component root); dropped once patched
    let stale = neo.handle();

    PropDelta::between(old.props(), neo.props()).apply(rt.surface(), el)?;
    let owner_changed = !same_owner(old_owner.as_ref(), neo_owner.as_ref());
    if owner_changed {
        retag(rt, el, neo_owner.as_ref())?;
    }
    if let (Some(instance), Some(slot)) = (scope, neo.props().slot_name()) {
        instance.register_ref(slot, el);
    }
    patch_children(rt, el, old.children(), neo.children(), scope)?;

    neo.set_handle(el);
    if let Some(stale) = stale {
        rt.surface().remove(stale)?;
    }
    if let (true, Some(previous)) = (owner_changed, old_owner) {
        debug!(component = ?previous.name(), ?el, "element taken over");
        previous.dispose();
    }
    Ok(())
}

/// Node currently rendered in place of `node`.
///
/// A component root follows its instance, which may have re-rendered (and
/// even rebuilt its element) since `node` was produced.
fn live_node(node: &VNode) -> VNode {
    node.owner()
        .and_then(|owner| owner.tree())
        .unwrap_or_else(|| node.clone())
}

/// Current element behind `node`
pub(crate) fn live_element(node: &VNode) -> Option<ElementId> {
    live_node(node).handle()
}

/// Dispose every instance rooted in `node`, which is no longer rendered
pub(crate) fn discard(node: &VNode) {
    release(node, &Owners::new());
}

/// Discard `old`'s element and put a fresh rendering of `neo` in its place.
/// The new element is inserted before the old one is removed.
fn renew(
    rt: &Runtime,
    old: &VNode,
    el: ElementId,
    neo: &VNode,
    scope: Option<&Instance>,
) -> Result<()> {
    debug!(old = %old.tag(), new = %neo.tag(), ?el, "rebuilding subtree");
    let stale = neo.handle();
    let fresh = neo.materialize(rt, None, scope)?;
    rt.surface().insert_after(el, fresh)?;
    rt.surface().remove(el)?;
    if let Some(stale) = stale {
        rt.surface().remove(stale)?;
    }
    release(old, &owners_of(neo));
    Ok(())
}

/// Point the component marker of `el` at its new owner
fn retag(rt: &Runtime, el: ElementId, owner: Option<&Instance>) -> Result<()> {
    let Some(marker) = &rt.config().component_attribute else {
        return Ok(());
    };
    match owner {
        Some(owner) => rt
            .surface()
            .set_attribute(el, marker, owner.name().unwrap_or(""))?,
        None => rt.surface().remove_attribute(el, marker)?,
    }
    Ok(())
}

fn patch_children(
    rt: &Runtime,
    el: ElementId,
    old: &Children,
    neo: &Children,
    scope: Option<&Instance>,
) -> Result<()> {
    if old.same(neo) {
        return Ok(());
    }

    match (old, neo) {
        (_, Children::Text(text)) => {
            remove_children(rt, old, &Owners::new())?;
            rt.surface().set_text(el, text)?;
            release_children(old, &Owners::new());
        }
        (Children::Nodes(before), Children::Nodes(after)) if before.len() == after.len() => {
            for (a, b) in before.iter().zip(after.iter()) {
                if let (Child::Node(a), Child::Node(b)) = (a, b) {
                    diff(rt, a, b, scope)?;
                }
            }
        }
        (_, Children::Nodes(after)) => {
            debug!(?el, count = after.len(), "replacing children");
            let keep = owners_in(neo);
            match old {
                Children::Text(_) => rt.surface().set_text(el, "")?,
                Children::Nodes(_) => remove_children(rt, old, &keep)?,
            }
            for child in after.iter() {
                attach_child(rt, el, child, scope)?;
            }
            release_children(old, &keep);
        }
    }
    Ok(())
}

/// Remove the elements of discarded children. Roots of instances in `keep`
/// stay put; they are appended again as they are.
fn remove_children(rt: &Runtime, children: &Children, keep: &Owners) -> Result<()> {
    for child in children.as_nodes().unwrap_or_default() {
        let Child::Node(node) = child else {
            continue;
        };
        if node.owner().is_some_and(|o| keep.iter().any(|k| k.ptr_eq(&o))) {
            continue;
        }
        if let Some(child_el) = live_element(node) {
            rt.surface().remove(child_el)?;
        }
    }
    Ok(())
}

fn same_owner(a: Option<&Instance>, b: Option<&Instance>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.ptr_eq(b),
        (None, None) => true,
        _ => false,
    }
}

fn owners_of(node: &VNode) -> Owners {
    let mut owners = Owners::new();
    collect_owners(node, &mut owners);
    owners
}

fn owners_in(children: &Children) -> Owners {
    let mut owners = Owners::new();
    if let Some(nodes) = children.as_nodes() {
        for child in nodes {
            if let Child::Node(node) = child {
                collect_owners(node, &mut owners);
            }
        }
    }
    owners
}

fn collect_owners(node: &VNode, out: &mut Owners) {
    if let Some(owner) = node.owner() {
        out.push(owner);
    }
    if let Some(nodes) = node.children().as_nodes() {
        for child in nodes {
            if let Child::Node(node) = child {
                collect_owners(node, out);
            }
        }
    }
}

/// Dispose every instance rooted in a discarded subtree unless it lives on in `keep`
fn release(node: &VNode, keep: &Owners) {
    if let Some(owner) = node.owner() {
        if !keep.iter().any(|k| k.ptr_eq(&owner)) {
            // The instance may have re-rendered since `node` was produced
            let current = owner.tree();
            owner.dispose();
            if let Some(current) = current.filter(|tree| !tree.ptr_eq(node)) {
                release_children(current.children(), keep);
            }
        }
    }
    release_children(node.children(), keep);
}

fn release_children(children: &Children, keep: &Owners) {
    if let Some(nodes) = children.as_nodes() {
        for child in nodes {
            if let Child::Node(node) = child {
                release(node, keep);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;
    use crate::config::Config;
    use crate::scheduler::TaskQueue;
    use crate::surface::{Handler, MemorySurface};
    use crate::vnode::Props;
    use std::rc::Rc;

    fn setup() -> (Rc<MemorySurface>, Runtime, ElementId) {
        let surface = Rc::new(MemorySurface::new());
        let rt = Runtime::new(surface.clone(), Rc::new(TaskQueue::new()), Config::default());
        let root = surface.create_root();
        (surface, rt, root)
    }

    fn mount(rt: &Runtime, root: ElementId, node: &VNode) -> ElementId {
        node.materialize(rt, Some(root), None).unwrap()
    }

    #[test]
    fn test_same_tag_reuses_element() {
        let (surface, rt, root) = setup();
        let old = VNode::new("div", Props::new().with("class", "a"), "one");
        let el = mount(&rt, root, &old);

        let neo = VNode::new("div", Props::new().with("class", "b"), "two");
        diff(&rt, &old, &neo, None).unwrap();

        assert_eq!(neo.handle(), Some(el));
        assert_eq!(surface.children(root), vec![el]);
        assert_eq!(surface.markup(el), "<div class=\"b\">two</div>");
    }

    #[test]
    fn test_tag_change_rebuilds_in_place() {
        let (surface, rt, root) = setup();
        let before = VNode::element("header");
        let old = VNode::element("div");
        let after = VNode::element("footer");
        mount(&rt, root, &before);
        let el = mount(&rt, root, &old);
        mount(&rt, root, &after);

        let neo = VNode::element("section");
        diff(&rt, &old, &neo, None).unwrap();

        let fresh = neo.handle().unwrap();
        assert_ne!(fresh, el);
        assert!(!surface.is_attached(el));
        assert_eq!(
            surface.children(root),
            vec![before.handle().unwrap(), fresh, after.handle().unwrap()]
        );
    }

    #[test]
    fn test_foreign_children_force_rebuild() {
        let (surface, rt, root) = setup();
        let native = surface.create_element("canvas").unwrap();
        let old = VNode::new("div", Props::new(), vec![Child::from(native)]);
        let el = mount(&rt, root, &old);

        let neo = VNode::new("div", Props::new(), vec![Child::from(native)]);
        diff(&rt, &old, &neo, None).unwrap();

        let fresh = neo.handle().unwrap();
        assert_ne!(fresh, el);
        assert_eq!(surface.children(fresh), vec![native]);
    }

    #[test]
    fn test_length_mismatch_replaces_children() {
        let (surface, rt, root) = setup();
        let old = VNode::new("div", Props::new(), vec![VNode::element("p")]);
        let el = mount(&rt, root, &old);
        let first_p = surface.children(el)[0];

        let neo = VNode::new("div", Props::new(), vec![VNode::element("p"), VNode::element("p")]);
        diff(&rt, &old, &neo, None).unwrap();

        let children = surface.children(el);
        assert_eq!(neo.handle(), Some(el));
        assert_eq!(children.len(), 2);
        assert!(!children.contains(&first_p));
        assert!(!surface.is_attached(first_p));
    }

    #[test]
    fn test_equal_length_patches_pairwise() {
        let (surface, rt, root) = setup();
        let old = VNode::new(
            "ul",
            Props::new(),
            vec![VNode::new("li", Props::new(), "a"), VNode::new("li", Props::new(), "b")],
        );
        let el = mount(&rt, root, &old);
        let items = surface.children(el);

        let neo = VNode::new(
            "ul",
            Props::new(),
            vec![VNode::new("li", Props::new(), "a"), VNode::new("li", Props::new(), "c")],
        );
        diff(&rt, &old, &neo, None).unwrap();

        assert_eq!(surface.children(el), items);
        assert_eq!(surface.text_content(el), "ac");
    }

    #[test]
    fn test_text_replaces_child_elements() {
        let (surface, rt, root) = setup();
        let old = VNode::new("div", Props::new(), vec![VNode::element("p")]);
        let el = mount(&rt, root, &old);

        let neo = VNode::new("div", Props::new(), "plain");
        diff(&rt, &old, &neo, None).unwrap();

        assert!(surface.children(el).is_empty());
        assert_eq!(surface.text_content(el), "plain");
    }

    #[test]
    fn test_listener_change_keeps_single_handler() {
        let (surface, rt, root) = setup();
        let old = VNode::new("button", Props::new().on("click", Handler::new(|_| {})), "go");
        let el = mount(&rt, root, &old);

        let neo = VNode::new("button", Props::new().on("click", Handler::new(|_| {})), "go");
        diff(&rt, &old, &neo, None).unwrap();

        assert_eq!(surface.listener_count(el, "click"), 1);
    }

    #[test]
    fn test_diff_twice_is_idempotent() {
        let (surface, rt, root) = setup();
        let old = VNode::new("div", Props::new().with("a", "1").with("b", "2"), "x");
        let el = mount(&rt, root, &old);

        let neo = VNode::new("div", Props::new().with("b", "3").with("c", "4"), "x");
        diff(&rt, &old, &neo, None).unwrap();
        let once = surface.attributes(el);
        diff(&rt, &old, &neo, None).unwrap();

        assert_eq!(surface.attributes(el), once);
        assert_eq!(neo.handle(), Some(el));
    }

    #[test]
    fn test_prerendered_neo_is_patched_into_old_element() {
        let (surface, rt, root) = setup();
        let old = VNode::new("div", Props::new(), vec![VNode::element("p")]);
        let el = mount(&rt, root, &old);
        let p = surface.children(el)[0];

        let neo = VNode::new("div", Props::new(), vec![VNode::new("p", Props::new(), "x")]);
        let rendered = neo.materialize(&rt, None, None).unwrap();
        diff(&rt, &old, &neo, None).unwrap();

        assert_eq!(neo.handle(), Some(el));
        assert_eq!(surface.children(root), vec![el]);
        assert_eq!(surface.children(el), vec![p]);
        assert_eq!(surface.text_content(p), "x");
        assert!(surface.children(rendered).is_empty());
    }

    #[test]
    fn test_unrendered_old_is_an_error() {
        let (_surface, rt, _root) = setup();
        let result = diff(&rt, &VNode::element("div"), &VNode::element("div"), None);
        assert!(matches!(result, Err(PivotError::NotMounted(_))));
    }

    #[test]
    fn test_shared_children_are_skipped() {
        let (surface, rt, root) = setup();
        let children = Children::nodes(vec![VNode::element("p")]);
        let old = VNode::new("div", Props::new(), children.clone());
        let el = mount(&rt, root, &old);
        let p = surface.children(el)[0];

        let neo = VNode::new("div", Props::new().with("id", "x"), children);
        diff(&rt, &old, &neo, None).unwrap();

        assert_eq!(surface.children(el), vec![p]);
    }
}
