use std::cell::RefCell;
use std::rc::Rc;

use spark_components::instance::{
    EventWiring, Injector, Mounter, RenderWiring, StateInitializer,
};
use spark_components::{
    Collaborators, ComponentType, Configuration, CreateOptions, Descriptor, Diagnostic, Directive,
    Getter, Hook, HookKind, InitError, InjectSpec, Instance, InternalComponentOptions,
    LifecyclePhase, Listener, Method, MountError, OptionKey, OptionValue, PropSpec, RenderFn,
    ResolveError, Value, VNode, WiringError,
    Watcher, create_instance, reset_config, reset_types, resolve_constructor_options,
    update_config,
};

type Log = Rc<RefCell<Vec<String>>>;

fn setup() -> Log {
    reset_types();
    reset_config();
    update_config(|c| c.production = false);
    Rc::new(RefCell::new(Vec::new()))
}

fn recording_hook(log: &Log, label: &str) -> Hook {
    let log = log.clone();
    let entry = label.to_string();
    Hook::new(label, move |_| {
        log.borrow_mut().push(entry.clone());
        Ok(())
    })
}

fn collect_diagnostics() -> Rc<RefCell<Vec<Diagnostic>>> {
    let seen: Rc<RefCell<Vec<Diagnostic>>> = Rc::new(RefCell::new(Vec::new()));
    let errors = seen.clone();
    let warnings = seen.clone();
    update_config(|c| {
        c.error_handler = Some(Rc::new(move |d| errors.borrow_mut().push(d.clone())));
        c.warn_handler = Some(Rc::new(move |d| warnings.borrow_mut().push(d.clone())));
    });
    seen
}

fn labels(config: &Configuration, kind: HookKind) -> Vec<String> {
    config
        .hooks(kind)
        .iter()
        .map(|h| h.label().to_string())
        .collect()
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_resolution_is_idempotent() {
    let log = setup();
    let a = ComponentType::new(Configuration::new().hook(HookKind::Created, recording_hook(&log, "a")));
    let b = a
        .extend(Configuration::new().hook(HookKind::Created, recording_hook(&log, "b")))
        .unwrap();

    let first = resolve_constructor_options(b).unwrap();
    let second = resolve_constructor_options(b).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.hooks(HookKind::Created).len(), second.hooks(HookKind::Created).len());
}

#[test]
fn test_ancestor_hook_added_once() {
    let log = setup();
    let a = ComponentType::new(
        Configuration::new()
            .hook(HookKind::Created, recording_hook(&log, "a1"))
            .hook(HookKind::Created, recording_hook(&log, "a2")),
    );
    let b = a
        .extend(Configuration::new().hook(HookKind::Created, recording_hook(&log, "b1")))
        .unwrap();
    resolve_constructor_options(b).unwrap();

    a.mixin(Configuration::new().hook(HookKind::Created, recording_hook(&log, "a3")))
        .unwrap();
    let resolved = resolve_constructor_options(b).unwrap();
    assert_eq!(labels(&resolved, HookKind::Created), ["a1", "a2", "a3", "b1"]);

    let vm = create_instance(b, CreateOptions::new()).unwrap();
    assert_eq!(vm.options().hooks(HookKind::Created).len(), 4);
    assert_eq!(log.borrow().as_slice(), ["a1", "a2", "a3", "b1"]);
}

#[test]
fn test_three_level_hooks_fire_ancestor_first() {
    let log = setup();
    let a = ComponentType::new(Configuration::new().hook(HookKind::Created, recording_hook(&log, "A")));
    let b = a
        .extend(Configuration::new().hook(HookKind::Created, recording_hook(&log, "B")))
        .unwrap();
    let c = b
        .extend(Configuration::new().hook(HookKind::Created, recording_hook(&log, "C")))
        .unwrap();

    create_instance(c, CreateOptions::new()).unwrap();
    assert_eq!(log.borrow().as_slice(), ["A", "B", "C"]);
}

#[test]
fn test_ancestor_key_visible_after_mutation() {
    setup();
    let a = ComponentType::new(Configuration::new());
    let b = a.extend(Configuration::new()).unwrap();
    let before = resolve_constructor_options(b).unwrap();

    a.patch_option(
        OptionKey::Custom("locale"),
        OptionValue::Scalar(spark_components::Item::Value(Value::from("fr"))),
    )
    .unwrap();
    resolve_constructor_options(a).unwrap();

    let after = resolve_constructor_options(b).unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
    assert!(after.contains(OptionKey::Custom("locale")));
    assert!(Rc::ptr_eq(&after, &resolve_constructor_options(b).unwrap()));
}

#[test]
fn test_root_child_scenario() {
    let log = setup();
    let root = ComponentType::new(Configuration::new().hook(HookKind::Created, recording_hook(&log, "h1")));
    let child = root
        .extend(Configuration::new().hook(HookKind::Created, recording_hook(&log, "h2")))
        .unwrap();

    create_instance(child, CreateOptions::new()).unwrap();
    assert_eq!(log.borrow().as_slice(), ["h1", "h2"]);
}

#[test]
fn test_cycle_aborts_instantiation() {
    setup();
    let a = ComponentType::new(Configuration::new());
    let b = a.extend(Configuration::new()).unwrap();
    a.rebase(Some(b)).unwrap();

    assert!(create_instance(b, CreateOptions::new()).is_err());
}

#[test]
fn test_unknown_type_aborts_instantiation() {
    setup();
    let stale = ComponentType::new(Configuration::new());
    reset_types();

    let err = create_instance(stale, CreateOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        InitError::Resolve(ResolveError::UnknownType(cid)) if cid == stale.cid()
    ));
}

// =============================================================================
// Fast path
// =============================================================================

#[test]
fn test_fast_path_matches_full_resolution() {
    let log = setup();
    let base = ComponentType::new(Configuration::new().hook(HookKind::Created, recording_hook(&log, "base")));
    let render = RenderFn::new(|_| VNode::text("card"));
    let card = base
        .extend(
            Configuration::new()
                .name("card")
                .hook(HookKind::Created, recording_hook(&log, "card"))
                .render(render.clone()),
        )
        .unwrap();

    let full = create_instance(card, CreateOptions::new()).unwrap();

    let parent = create_instance(base, CreateOptions::new()).unwrap();
    let placeholder = parent.create_element(Descriptor::component(card));
    let fast = create_instance(
        card,
        CreateOptions::internal(InternalComponentOptions {
            parent: parent.clone(),
            parent_vnode: placeholder,
            render: None,
        }),
    )
    .unwrap();

    assert!(fast.options().is_internal());
    assert!(!full.options().is_internal());

    let full_hooks = full.options().hooks(HookKind::Created);
    let fast_hooks = fast.options().hooks(HookKind::Created);
    assert_eq!(full_hooks, fast_hooks);

    let full_components = full.options().config().map(OptionKey::Components).unwrap().clone();
    let fast_components = fast.options().config().map(OptionKey::Components).unwrap().clone();
    assert_eq!(full_components.len(), fast_components.len());
    for (name, item) in &full_components {
        assert!(item.same(&fast_components[name]));
    }

    assert!(full.options().render().unwrap().ptr_eq(&render));
    assert!(fast.options().render().unwrap().ptr_eq(&render));
}

#[test]
fn test_fast_path_sees_ancestor_mixin_without_render() {
    let log = setup();
    let base = ComponentType::new(Configuration::new());
    let card = base
        .extend(Configuration::new().hook(HookKind::Created, recording_hook(&log, "card")))
        .unwrap();
    let parent = create_instance(base, CreateOptions::new()).unwrap();

    base.mixin(Configuration::new().hook(HookKind::Created, recording_hook(&log, "late")))
        .unwrap();
    log.borrow_mut().clear();

    // Placeholder built by hand, so nothing refreshed the type beforehand.
    let mut placeholder = VNode::element("card", Vec::new());
    placeholder.component = Some(spark_components::instance::VNodeComponentOptions {
        ty: card,
        props_data: Default::default(),
        listeners: Default::default(),
        children: Vec::new(),
        tag: "card".into(),
    });
    create_instance(
        card,
        CreateOptions::internal(InternalComponentOptions {
            parent,
            parent_vnode: placeholder,
            render: None,
        }),
    )
    .unwrap();

    assert_eq!(log.borrow().as_slice(), ["late", "card"]);
}

#[test]
fn test_fast_path_reads_placeholder_data() {
    setup();
    let base = ComponentType::new(Configuration::new());
    let item = base
        .extend(Configuration::new().name("todo-item").prop("title", PropSpec::new()))
        .unwrap();
    let parent = create_instance(
        base,
        CreateOptions::with_config(Configuration::new().component("todo-item", item)),
    )
    .unwrap();

    let placeholder = parent.create_element(
        Descriptor::new("todo-item")
            .attr("title", "write tests")
            .child(VNode::text("slot")),
    );
    assert!(placeholder.is_component());

    let vm = create_instance(
        item,
        CreateOptions::internal(InternalComponentOptions {
            parent: parent.clone(),
            parent_vnode: placeholder,
            render: None,
        }),
    )
    .unwrap();

    assert_eq!(vm.get("title"), Some(Value::from("write tests")));
    assert_eq!(vm.slots(), vec![VNode::text("slot")]);
    assert_eq!(vm.name(), "<TodoItem>");
    assert!(vm.parent().unwrap().ptr_eq(&parent));
    assert_eq!(parent.children().len(), 1);
}

// =============================================================================
// Phases and collaborators
// =============================================================================

struct Recording {
    log: Log,
    inner: Collaborators,
}

impl Recording {
    fn record(&self, what: &str, vm: &Instance) {
        self.log.borrow_mut().push(format!("{what}@{:?}", vm.phase()));
    }
}

impl StateInitializer for Recording {
    fn init_state(&self, vm: &Instance) -> Result<(), WiringError> {
        self.record("state", vm);
        self.inner.state.init_state(vm)
    }
}

impl Injector for Recording {
    fn resolve_injections(&self, vm: &Instance) -> Result<(), WiringError> {
        self.record("inject", vm);
        self.inner.injector.resolve_injections(vm)
    }

    fn resolve_provisions(&self, vm: &Instance) -> Result<(), WiringError> {
        self.record("provide", vm);
        self.inner.injector.resolve_provisions(vm)
    }
}

impl EventWiring for Recording {
    fn init_events(&self, vm: &Instance) -> Result<(), WiringError> {
        self.record("events", vm);
        self.inner.events.init_events(vm)
    }
}

impl RenderWiring for Recording {
    fn init_render(&self, vm: &Instance) -> Result<(), WiringError> {
        self.record("render", vm);
        self.inner.render.init_render(vm)
    }
}

impl Mounter for Recording {
    fn mount(&self, vm: &Instance, target: Option<&str>) -> Result<(), MountError> {
        self.record("mount", vm);
        self.inner.mounter.mount(vm, target)
    }
}

fn recording_collaborators(log: &Log) -> Collaborators {
    let recording = Rc::new(Recording {
        log: log.clone(),
        inner: Collaborators::default(),
    });
    Collaborators {
        state: recording.clone(),
        injector: recording.clone(),
        events: recording.clone(),
        render: recording.clone(),
        mounter: recording,
    }
}

#[test]
fn test_phases_run_in_order() {
    let log = setup();
    let ty = ComponentType::new(
        Configuration::new()
            .el("#app")
            .render(RenderFn::new(|_| VNode::element("div", Vec::new())))
            .hook(HookKind::BeforeCreate, recording_hook(&log, "before_create"))
            .hook(HookKind::Created, recording_hook(&log, "created"))
            .hook(HookKind::BeforeMount, recording_hook(&log, "before_mount"))
            .hook(HookKind::Mounted, recording_hook(&log, "mounted")),
    );

    let vm = create_instance(
        ty,
        CreateOptions::new().collaborators(recording_collaborators(&log)),
    )
    .unwrap();

    assert_eq!(
        log.borrow().as_slice(),
        [
            "events@LifecycleLinked",
            "render@EventsWired",
            "before_create",
            "inject@BeforeCreateFired",
            "state@InjectionsResolved",
            "provide@StateInitialized",
            "created",
            "before_mount",
            "mount@CreatedFired",
            "mounted",
        ]
    );
    assert_eq!(vm.phase(), LifecyclePhase::Mounted);
    assert!(vm.is_mounted());
    assert_eq!(vm.mount_target().as_deref(), Some("#app"));
}

#[test]
fn test_no_mount_without_target() {
    setup();
    let ty = ComponentType::new(Configuration::new().render(RenderFn::new(|_| VNode::empty())));
    let vm = create_instance(ty, CreateOptions::new()).unwrap();

    assert_eq!(vm.phase(), LifecyclePhase::CreatedFired);
    assert!(!vm.is_mounted());

    vm.mount(Some("#late")).unwrap();
    assert_eq!(vm.phase(), LifecyclePhase::Mounted);
}

struct FailingEvents;

impl EventWiring for FailingEvents {
    fn init_events(&self, _vm: &Instance) -> Result<(), WiringError> {
        Err(WiringError::Failed("listener table unavailable".into()))
    }
}

#[test]
fn test_failing_collaborator_is_isolated() {
    let log = setup();
    let seen = collect_diagnostics();
    let ty = ComponentType::new(Configuration::new().hook(HookKind::Created, recording_hook(&log, "created")));

    let collaborators = Collaborators {
        events: Rc::new(FailingEvents),
        ..Collaborators::default()
    };
    let vm = create_instance(ty, CreateOptions::new().collaborators(collaborators)).unwrap();

    assert_eq!(vm.phase(), LifecyclePhase::CreatedFired);
    assert_eq!(log.borrow().as_slice(), ["created"]);
    assert!(matches!(
        seen.borrow().as_slice(),
        [Diagnostic::WiringFailed { phase: LifecyclePhase::EventsWired, .. }]
    ));
}

#[test]
fn test_failing_hook_is_reported_and_others_run() {
    let log = setup();
    let seen = collect_diagnostics();
    let ty = ComponentType::new(
        Configuration::new()
            .hook(HookKind::Created, Hook::new("broken", |_| Err("boom".into())))
            .hook(HookKind::Created, recording_hook(&log, "after")),
    );

    let vm = create_instance(ty, CreateOptions::new()).unwrap();

    assert_eq!(log.borrow().as_slice(), ["after"]);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        Diagnostic::HookFailed {
            uid, hook, label, error, ..
        } => {
            assert_eq!(*uid, vm.uid());
            assert_eq!(*hook, HookKind::Created);
            assert_eq!(label, "broken");
            assert_eq!(error.message(), "boom");
        }
        other => panic!("unexpected diagnostic: {other:?}"),
    }
}

// =============================================================================
// Application scenario
// =============================================================================

#[test]
fn test_global_mixin_reaches_child_components() {
    let log = setup();
    let base = ComponentType::new(Configuration::new());
    let child = base
        .extend(
            Configuration::new()
                .name("child")
                .hook(HookKind::Created, recording_hook(&log, "child created"))
                .hook(HookKind::Mounted, recording_hook(&log, "child mounted"))
                .render(RenderFn::new(|_| VNode::text("child"))),
        )
        .unwrap();

    // Applied after the subtype was defined.
    let global_log = log.clone();
    base.mixin(Configuration::new().hook(
        HookKind::Created,
        Hook::new("global", move |vm| {
            global_log.borrow_mut().push(format!("global {}", vm.name()));
            Ok(())
        }),
    ))
    .unwrap();

    let root_log = log.clone();
    let app = create_instance(
        base,
        CreateOptions::with_config(
            Configuration::new()
                .el("#app")
                .component("child", child)
                .render(RenderFn::new(|vm| {
                    vm.create_element(Descriptor::new("div").child(
                        vm.create_element(Descriptor::new("child")),
                    ))
                }))
                .hook(
                    HookKind::Mounted,
                    Hook::new("root mounted", move |_| {
                        root_log.borrow_mut().push("root mounted".into());
                        Ok(())
                    }),
                ),
        ),
    )
    .unwrap();

    assert_eq!(
        log.borrow().as_slice(),
        [
            "global <Root>",
            "global <Child>",
            "child created",
            "child mounted",
            "root mounted",
        ]
    );
    let children = app.children();
    assert_eq!(children.len(), 1);
    assert!(children[0].options().is_internal());
    assert!(children[0].root().ptr_eq(&app));
}

#[test]
fn test_recursive_component_through_self_registration() {
    setup();
    let base = ComponentType::new(Configuration::new());
    let tree = base
        .extend(
            Configuration::new()
                .name("tree")
                .prop("depth", PropSpec::new().with_default(0))
                .render(RenderFn::new(|vm| {
                    let depth = vm.get("depth").and_then(|d| d.as_number()).unwrap_or(0.0);
                    if depth >= 2.0 {
                        return VNode::text("leaf");
                    }
                    vm.create_element(Descriptor::new("tree").attr("depth", depth + 1.0))
                })),
        )
        .unwrap();

    let root = create_instance(tree, CreateOptions::new()).unwrap();
    root.mount(None).unwrap();

    let child = &root.children()[0];
    let grandchild = &child.children()[0];
    assert_eq!(grandchild.get("depth"), Some(Value::Number(2.0)));
    assert!(grandchild.children().is_empty());
}

#[test]
fn test_registered_directive_applied_on_mount() {
    let log = setup();
    let base = ComponentType::new(Configuration::new());
    let directive_log = log.clone();
    base.directive(
        "focus",
        Directive::new(move |node, binding| {
            directive_log
                .borrow_mut()
                .push(format!("{} {binding}", node.tag.clone().unwrap_or_default()));
        }),
    )
    .unwrap();

    let vm = create_instance(
        base,
        CreateOptions::with_config(Configuration::new().render(RenderFn::new(|vm| {
            vm.create_element(Descriptor::new("input").directive("focus", true))
        }))),
    )
    .unwrap();
    vm.mount(None).unwrap();

    assert_eq!(log.borrow().as_slice(), ["input true"]);
}

// =============================================================================
// State, events, injection
// =============================================================================

#[test]
fn test_state_and_watchers() {
    setup();
    let changes: Rc<RefCell<Vec<(Value, Value)>>> = Rc::new(RefCell::new(Vec::new()));
    let seen = changes.clone();
    let ty = ComponentType::new(
        Configuration::new()
            .prop("step", PropSpec::new().with_default(1))
            .data("count", Getter::new(|vm| vm.get("step").unwrap_or_default()))
            .computed(
                "double",
                Getter::new(|vm| {
                    let count = vm.get("count").and_then(|v| v.as_number()).unwrap_or(0.0);
                    Value::from(count * 2.0)
                }),
            )
            .method(
                "increment",
                Method::new(|vm, _| {
                    let count = vm.get("count").and_then(|v| v.as_number()).unwrap_or(0.0);
                    let step = vm.get("step").and_then(|v| v.as_number()).unwrap_or(0.0);
                    vm.set("count", count + step);
                    Value::Null
                }),
            )
            .watch(
                "count",
                Watcher::new(move |_, new, old| seen.borrow_mut().push((new.clone(), old.clone()))),
            ),
    );

    let vm = create_instance(ty, CreateOptions::new().prop("step", 5)).unwrap();
    assert_eq!(vm.get("count"), Some(Value::Number(5.0)));
    assert_eq!(vm.get("double"), Some(Value::Number(10.0)));
    assert!(changes.borrow().is_empty());

    vm.call("increment", &[]);
    assert_eq!(vm.get("double"), Some(Value::Number(20.0)));
    assert_eq!(
        changes.borrow().as_slice(),
        [(Value::Number(10.0), Value::Number(5.0))]
    );

    vm.destroy();
    vm.set("count", 100);
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn test_missing_required_prop_warns() {
    setup();
    let seen = collect_diagnostics();
    let ty = ComponentType::new(Configuration::new().prop("id", PropSpec::new().required()));

    let vm = create_instance(ty, CreateOptions::new()).unwrap();
    assert_eq!(vm.get("id"), Some(Value::Null));
    assert!(matches!(
        seen.borrow().as_slice(),
        [Diagnostic::MissingProp { key, .. }] if key == "id"
    ));
}

#[test]
fn test_injection_from_ancestor() {
    setup();
    let seen = collect_diagnostics();
    let base = ComponentType::new(Configuration::new());
    let provider = create_instance(
        base,
        CreateOptions::with_config(
            Configuration::new()
                .data("theme", Getter::new(|_| Value::from("dark")))
                .provide("theme", Getter::new(|vm| vm.get("theme").unwrap_or_default())),
        ),
    )
    .unwrap();
    let middle = create_instance(base, CreateOptions::new().parent(&provider)).unwrap();
    let consumer = create_instance(
        base,
        CreateOptions::with_config(
            Configuration::new()
                .inject("theme", InjectSpec::key("theme"))
                .inject("size", InjectSpec::key("size").with_default(12))
                .inject("locale", InjectSpec::key("locale")),
        )
        .parent(&middle),
    )
    .unwrap();

    assert_eq!(consumer.injected("theme"), Some(Value::from("dark")));
    assert_eq!(consumer.get("theme"), Some(Value::from("dark")));
    assert_eq!(consumer.get("size"), Some(Value::Number(12.0)));
    assert_eq!(consumer.get("locale"), None);

    let seen = seen.borrow();
    assert!(matches!(
        seen.as_slice(),
        [Diagnostic::MissingInjection { key, .. }] if key == "locale"
    ));
}

#[test]
fn test_parent_listeners_and_hook_events() {
    let log = setup();
    let ty = ComponentType::new(Configuration::new());
    let parent = create_instance(ty, CreateOptions::new()).unwrap();

    let event_log = log.clone();
    let hook_log = log.clone();
    let vm = create_instance(
        ty,
        CreateOptions::new()
            .parent(&parent)
            .on(
                "saved",
                Listener::new(move |_, args| {
                    event_log.borrow_mut().push(format!("saved {}", args[0]));
                }),
            )
            .on(
                HookKind::Created.event_name(),
                Listener::new(move |vm, _| {
                    hook_log.borrow_mut().push(format!("hook event {}", vm.uid()));
                }),
            ),
    )
    .unwrap();

    assert_eq!(vm.emit("saved", &[Value::from("draft")]), 1);
    assert_eq!(
        log.borrow().as_slice(),
        [format!("hook event {}", vm.uid()), "saved draft".to_string()]
    );
}

#[test]
fn test_undeclared_access_is_guarded_in_development() {
    setup();
    let seen = collect_diagnostics();
    let ty = ComponentType::new(Configuration::new().data("known", Getter::new(|_| Value::from(1))));

    let vm = create_instance(ty, CreateOptions::new()).unwrap();
    assert!(vm.is_guarded());
    assert_eq!(vm.get("known"), Some(Value::Number(1.0)));
    assert_eq!(vm.get("unknown"), None);
    assert!(matches!(
        seen.borrow().as_slice(),
        [Diagnostic::UndeclaredProperty { key, .. }] if key == "unknown"
    ));
}

#[test]
fn test_no_guard_in_production() {
    setup();
    let seen = collect_diagnostics();
    update_config(|c| c.production = true);
    let ty = ComponentType::new(Configuration::new());

    let vm = create_instance(ty, CreateOptions::new()).unwrap();
    assert!(!vm.is_guarded());
    assert_eq!(vm.get("unknown"), None);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_reserved_data_name_warns() {
    setup();
    let seen = collect_diagnostics();
    let ty = ComponentType::new(Configuration::new().data("_secret", Getter::new(|_| Value::from(1))));

    let vm = create_instance(ty, CreateOptions::new()).unwrap();
    assert!(!vm.has("_secret"));
    assert!(matches!(
        seen.borrow().as_slice(),
        [Diagnostic::ReservedProperty { key, .. }] if key == "_secret"
    ));
}

// =============================================================================
// Teardown and linking
// =============================================================================

#[test]
fn test_destroy_tears_down_tree() {
    let log = setup();
    let base = ComponentType::new(Configuration::new());
    let child = base
        .extend(
            Configuration::new()
                .name("leaf")
                .render(RenderFn::new(|_| VNode::text("leaf")))
                .hook(HookKind::BeforeDestroy, recording_hook(&log, "leaf before_destroy"))
                .hook(HookKind::Destroyed, recording_hook(&log, "leaf destroyed")),
        )
        .unwrap();
    let app = create_instance(
        base,
        CreateOptions::with_config(
            Configuration::new()
                .component("leaf", child)
                .render(RenderFn::new(|vm| vm.create_element(Descriptor::new("leaf"))))
                .hook(HookKind::BeforeDestroy, recording_hook(&log, "app before_destroy"))
                .hook(HookKind::Destroyed, recording_hook(&log, "app destroyed")),
        ),
    )
    .unwrap();
    app.mount(None).unwrap();
    let leaf = app.children()[0].clone();

    app.destroy();
    app.destroy();

    assert_eq!(
        log.borrow().as_slice(),
        [
            "app before_destroy",
            "leaf before_destroy",
            "leaf destroyed",
            "app destroyed",
        ]
    );
    assert!(app.is_destroyed());
    assert!(leaf.is_destroyed());
    assert_eq!(app.phase(), LifecyclePhase::Destroyed);
    assert!(app.children().is_empty());
    assert!(app.vnode().is_none());
    assert!(matches!(app.mount(None), Err(MountError::Destroyed { .. })));
}

#[test]
fn test_destroyed_child_leaves_parent() {
    setup();
    let ty = ComponentType::new(Configuration::new());
    let parent = create_instance(ty, CreateOptions::new()).unwrap();
    let child = create_instance(ty, CreateOptions::new().parent(&parent)).unwrap();
    assert_eq!(parent.children().len(), 1);

    child.destroy();
    assert!(parent.children().is_empty());
    assert!(!parent.is_destroyed());
}

#[test]
fn test_abstract_parent_is_skipped() {
    setup();
    let ty = ComponentType::new(Configuration::new());
    let root = create_instance(ty, CreateOptions::new()).unwrap();
    let wrapper = create_instance(
        ty,
        CreateOptions::with_config(Configuration::new().set_abstract(true)).parent(&root),
    )
    .unwrap();
    let inner = create_instance(ty, CreateOptions::new().parent(&wrapper)).unwrap();

    assert!(inner.parent().unwrap().ptr_eq(&root));
    assert!(wrapper.children().is_empty());
    assert_eq!(root.children().len(), 1);
    assert!(inner.root().ptr_eq(&root));
}

#[test]
fn test_mount_from_created_hook() {
    let log = setup();
    let ty = ComponentType::new(
        Configuration::new()
            .el("#app")
            .render(RenderFn::new(|_| VNode::text("ready")))
            .hook(
                HookKind::Created,
                Hook::new("mount-early", |vm| {
                    assert!(vm.mount(None).is_ok());
                    Ok(())
                }),
            )
            .hook(HookKind::Mounted, recording_hook(&log, "mounted")),
    );

    let vm = create_instance(ty, CreateOptions::new()).unwrap();

    assert!(vm.is_mounted());
    assert_eq!(vm.phase(), LifecyclePhase::Mounted);
    assert_eq!(vm.vnode(), Some(VNode::text("ready")));
    assert_eq!(log.borrow().as_slice(), ["mounted"]);
}

#[test]
fn test_destroy_from_before_create_hook_stops_creation() {
    let log = setup();
    let ty = ComponentType::new(
        Configuration::new()
            .hook(
                HookKind::BeforeCreate,
                Hook::new("bail", |vm| {
                    vm.destroy();
                    Ok(())
                }),
            )
            .data("count", Getter::new(|_| Value::from(1)))
            .hook(HookKind::Created, recording_hook(&log, "created"))
            .hook(HookKind::Destroyed, recording_hook(&log, "destroyed")),
    );

    let vm = create_instance(ty, CreateOptions::new()).unwrap();

    assert!(vm.is_destroyed());
    assert_eq!(vm.phase(), LifecyclePhase::Destroyed);
    assert_eq!(vm.field_kind("count"), None);
    assert_eq!(log.borrow().as_slice(), ["destroyed"]);
}

#[test]
fn test_data_initializers_run_in_declaration_order() {
    setup();
    let seen = collect_diagnostics();
    let base = ComponentType::new(Configuration::new().data("a", Getter::new(|_| Value::from("A"))));
    let sub = base
        .extend(
            Configuration::new()
                .data("b", Getter::new(|vm| vm.get("a").unwrap_or_default()))
                .data("c", Getter::new(|vm| vm.get("b").unwrap_or_default())),
        )
        .unwrap();
    let ordered = ComponentType::new(
        Configuration::new()
            .data("z", Getter::new(|_| Value::from("Z")))
            .data("y", Getter::new(|vm| vm.get("z").unwrap_or_default())),
    );

    for _ in 0..20 {
        let vm = create_instance(ordered, CreateOptions::new()).unwrap();
        assert_eq!(vm.get("y"), Some(Value::from("Z")));

        let vm = create_instance(sub, CreateOptions::new()).unwrap();
        assert_eq!(vm.get("b"), Some(Value::from("A")));
        assert_eq!(vm.get("c"), Some(Value::from("A")));
    }
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_deactivate_and_activate_subtree() {
    let log = setup();
    let ty = ComponentType::new(
        Configuration::new()
            .hook(HookKind::Activated, recording_hook(&log, "activated"))
            .hook(HookKind::Deactivated, recording_hook(&log, "deactivated")),
    );
    let parent = create_instance(ty, CreateOptions::new()).unwrap();
    let child = create_instance(ty, CreateOptions::new().parent(&parent)).unwrap();

    parent.deactivate();
    parent.deactivate();
    assert!(parent.is_inactive());
    assert!(child.is_inactive());

    parent.activate();
    assert!(!child.is_inactive());
    assert_eq!(
        log.borrow().as_slice(),
        ["deactivated", "deactivated", "activated", "activated"]
    );
}

#[test]
fn test_uids_increase() {
    setup();
    let ty = ComponentType::new(Configuration::new());
    let first = create_instance(ty, CreateOptions::new()).unwrap();
    let second = create_instance(ty, CreateOptions::new()).unwrap();
    assert!(second.uid() > first.uid());
    assert_eq!(first.name(), "<Root>");
}
