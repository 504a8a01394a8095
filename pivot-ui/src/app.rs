use crate::component::{Component, Definition, Instance, Setup};
use crate::config::Config;
use crate::error::{PivotError, Result};
use crate::reconcile;
use crate::registry::Registry;
use crate::runtime::{Runtime, SharedRuntime};
use crate::scheduler::Defer;
use crate::surface::{ElementId, Surface};
use crate::vnode::{Child, Children, Props, VNode};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Argument to [`Pivot::render`], classified by kind
#[derive(Debug, Clone)]
pub enum Arg {
    Props(Props),
    Children(Children),
}

impl From<Props> for Arg {
    fn from(props: Props) -> Self {
        Arg::Props(props)
    }
}

impl From<Children> for Arg {
    fn from(children: Children) -> Self {
        Arg::Children(children)
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Children(text.into())
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Children(text.into())
    }
}

impl From<Vec<VNode>> for Arg {
    fn from(nodes: Vec<VNode>) -> Self {
        Arg::Children(nodes.into())
    }
}

impl From<Vec<Child>> for Arg {
    fn from(children: Vec<Child>) -> Self {
        Arg::Children(children.into())
    }
}

/// Main entry point combining the registry and the shared runtime.
///
/// Cloning shares both; instances keep a clone to reach the surface and the
/// deferral primitive.
#[derive(Clone)]
pub struct Pivot {
    registry: Rc<Registry>,
    runtime: SharedRuntime,
}

impl Pivot {
    /// Create a new Pivot with an empty registry
    pub fn new(surface: Rc<dyn Surface>, defer: Rc<dyn Defer>, config: Config) -> Self {
        Self::with_registry(Rc::new(Registry::new()), surface, defer, config)
    }

    pub fn with_registry(
        registry: Rc<Registry>,
        surface: Rc<dyn Surface>,
        defer: Rc<dyn Defer>,
        config: Config,
    ) -> Self {
        Self {
            registry,
            runtime: Rc::new(Runtime::new(surface, defer, config)),
        }
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// Shorthand for [`Registry::register`]
    pub fn register<F>(&self, name: Option<&str>, generator: F) -> Result<Rc<Definition>>
    where
        F: Fn(&mut Setup<'_>) -> Box<dyn Component> + 'static,
    {
        self.registry.register(name, generator)
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn surface(&self) -> &dyn Surface {
        self.runtime.surface()
    }

    pub fn config(&self) -> &Config {
        self.runtime.config()
    }

    /// Build a node from a tag or a registered component name.
    ///
    /// A registered name is instantiated with the given props and its mounted
    /// tree is returned. Anything else becomes a bare, unrendered node. When
    /// several args of one kind are given the last one wins.
    pub fn render<I>(&self, tag_or_name: &str, args: I) -> Result<VNode>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        let mut props = None;
        let mut children = None;
        for arg in args {
            match arg.into() {
                Arg::Props(p) => props = Some(p),
                Arg::Children(c) => children = Some(c),
            }
        }
        let props = props.unwrap_or_default();

        if let Some(definition) = self.registry.get(tag_or_name) {
            if children.is_some() {
                trace!(component = tag_or_name, "children ignored for component");
            }
            let instance = self.instantiate(&definition, props)?;
            return instance
                .tree()
                .ok_or_else(|| PivotError::NotMounted(tag_or_name.into()));
        }

        Ok(VNode::new(tag_or_name, props, children.unwrap_or_default()))
    }

    /// Create an instance of `definition` and run its first render
    pub fn instantiate(&self, definition: &Definition, props: Props) -> Result<Instance> {
        let instance = Instance::new(self, definition, props);
        instance.render()?;
        Ok(instance)
    }

    /// Attach `node` as the last child of `container`, materializing it first
    /// unless it already has an element.
    pub fn mount(&self, container: ElementId, node: &VNode) -> Result<ElementId> {
        let el = match reconcile::live_element(node) {
            Some(el) => {
                self.surface().append_child(container, el)?;
                el
            }
            None => node.materialize(&self.runtime, Some(container), None)?,
        };
        debug!(tag = %node.tag(), ?container, ?el, "mounted");
        Ok(el)
    }

    /// Detach the element of `node` and dispose every instance rendered in it.
    ///
    /// A component root keeps its instance alive while it is held, so this is
    /// how a top-level instance is torn down.
    pub fn unmount(&self, node: &VNode) -> Result<()> {
        let el = reconcile::live_element(node)
            .ok_or_else(|| PivotError::NotMounted(node.tag().into()))?;
        self.surface().remove(el)?;
        reconcile::discard(node);
        debug!(tag = %node.tag(), ?el, "unmounted");
        Ok(())
    }

    /// Reconcile the live element of `old` with `neo`
    pub fn diff(&self, old: &VNode, neo: &VNode) -> Result<()> {
        reconcile::diff(&self.runtime, old, neo, None)
    }
}

impl fmt::Debug for Pivot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pivot")
            .field("components", &self.registry.names())
            .field("runtime", &self.runtime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TaskQueue;
    use crate::surface::{Handler, MemorySurface};

    fn setup() -> (Pivot, Rc<MemorySurface>, ElementId) {
        let surface = Rc::new(MemorySurface::new());
        let root = surface.create_root();
        let pivot = Pivot::new(surface.clone(), Rc::new(TaskQueue::new()), Config::default());
        (pivot, surface, root)
    }

    struct Label;

    impl Component for Label {
        fn render(&self, cx: &Instance) -> Result<VNode> {
            let text = match cx.props().get_str("text") {
                Some(value) => value.to_attr_value(&"text".into())?,
                None => String::new(),
            };
            Ok(VNode::new("label", Props::new(), text))
        }
    }

    #[test]
    fn test_render_bare_node() {
        let (pivot, surface, root) = setup();
        let node = pivot
            .render(
                "button",
                [
                    Arg::from(Props::new().on("click", Handler::new(|_| {}))),
                    Arg::from("Click me"),
                ],
            )
            .unwrap();
        assert!(!node.is_mounted());

        let el = pivot.mount(root, &node).unwrap();
        assert_eq!(surface.listener_count(el, "click"), 1);
        assert_eq!(surface.text_content(el), "Click me");
    }

    #[test]
    fn test_last_arg_of_each_kind_wins() {
        let (pivot, _surface, _root) = setup();
        let node = pivot
            .render(
                "p",
                [
                    Arg::from("first"),
                    Arg::from(Props::new().with("id", "a")),
                    Arg::from("second"),
                    Arg::from(Props::new().with("id", "b")),
                ],
            )
            .unwrap();

        assert!(matches!(node.children(), Children::Text(t) if t == "second"));
        assert_eq!(node.props().get_str("id"), Some(&"b".into()));
    }

    #[test]
    fn test_render_registered_component() {
        let (pivot, surface, root) = setup();
        pivot
            .register(Some("Label"), |_setup: &mut Setup<'_>| {
                Box::new(Label) as Box<dyn Component>
            })
            .unwrap();

        let tree = pivot
            .render("Label", [Props::new().with("text", "hi")])
            .unwrap();
        let el = tree.handle().unwrap();
        assert!(surface.parent(el).is_none());

        assert_eq!(pivot.mount(root, &tree).unwrap(), el);
        assert_eq!(surface.children(root), vec![el]);
        assert_eq!(surface.markup(el), "<label data-pivot=\"Label\">hi</label>");
    }

    struct Holder {
        _witness: Rc<()>,
    }

    impl Component for Holder {
        fn render(&self, _cx: &Instance) -> Result<VNode> {
            Ok(VNode::new("div", Props::new(), vec![VNode::element("p")]))
        }
    }

    #[test]
    fn test_unmount_frees_top_level_instance() {
        let (pivot, surface, root) = setup();
        let witness = Rc::new(());
        let definition = {
            let witness = witness.clone();
            Definition::new(Some("Holder"), move |_setup: &mut Setup<'_>| {
                Box::new(Holder {
                    _witness: witness.clone(),
                }) as Box<dyn Component>
            })
        };
        let instance = pivot.instantiate(&definition, Props::new()).unwrap();
        let tree = instance.tree().unwrap();
        let el = pivot.mount(root, &tree).unwrap();
        drop((instance, definition));
        assert_eq!(Rc::strong_count(&witness), 2);

        pivot.unmount(&tree).unwrap();
        assert!(surface.children(root).is_empty());
        assert!(tree.owner().unwrap().is_disposed());
        drop(tree);
        assert_eq!(Rc::strong_count(&witness), 1);

        let bare = VNode::element("span");
        assert!(matches!(
            pivot.unmount(&bare),
            Err(PivotError::NotMounted(_))
        ));
        assert!(!surface.is_attached(el));
    }
}
