use super::*;
use crate::expression::Expression;
use crate::template::{NodeData, TemplateNode};
use j2py_common::{ConfigLayer, SettingValue};

fn config_with(key: &str, handlers: &[&str]) -> Config {
    let mut config = Config::with_defaults();
    config.push_layer(ConfigLayer::new("test").with(
        key,
        handlers
            .iter()
            .map(|&name| SettingValue::from(name))
            .collect::<Vec<_>>(),
    ));
    config
}

fn bare_settings() -> EmitSettings {
    let mut settings = EmitSettings::defaults();
    settings.module_preamble.clear();
    settings
}

fn append_marker(
    tree: &mut TemplateTree,
    id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    tree.add_line(id, "marker = 1");
    Ok(())
}

fn always_fail(
    _tree: &mut TemplateTree,
    _id: NodeId,
    _settings: &EmitSettings,
) -> Result<(), HandlerError> {
    Err(HandlerError::new("refused"))
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_default_chains_resolve() {
    let pipeline = HandlerPipeline::resolve(&Config::with_defaults(), HandlerRegistry::builtin()).unwrap();
    let module: Vec<&str> = pipeline
        .finishing(NodeKind::Module)
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(module, vec!["modules.ifMainScript"]);
    assert_eq!(pipeline.output(NodeKind::Module).len(), 2);
    let class: Vec<&str> = pipeline
        .finishing(NodeKind::Class)
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(class, vec!["classes.fixCtor"]);
    assert_eq!(pipeline.finishing(NodeKind::Comment).len(), 1);
    assert!(pipeline.finishing(NodeKind::Method).is_empty());
}

#[test]
fn test_chains_combine_across_layers() {
    let config = config_with("moduleHandlers", &["common.simpleDocString"]);
    let pipeline = HandlerPipeline::resolve(&config, HandlerRegistry::builtin()).unwrap();
    let names: Vec<&str> = pipeline
        .finishing(NodeKind::Module)
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(names, vec!["modules.ifMainScript", "common.simpleDocString"]);
}

#[test]
fn test_unknown_handler_is_rejected() {
    let config = config_with("classHandlers", &["classes.missing"]);
    let err = HandlerPipeline::resolve(&config, HandlerRegistry::builtin()).unwrap_err();
    assert_eq!(
        err,
        BuildError::UnknownHandler {
            setting: "classHandlers".to_string(),
            name: "classes.missing".to_string(),
        }
    );
}

#[test]
fn test_output_handler_in_finishing_chain_is_rejected() {
    let config = config_with("classHandlers", &["output.collapseBlankLines"]);
    let err = HandlerPipeline::resolve(&config, HandlerRegistry::builtin()).unwrap_err();
    assert_eq!(
        err,
        BuildError::MisplacedHandler {
            setting: "classHandlers".to_string(),
            name: "output.collapseBlankLines".to_string(),
            expected: "finishing",
        }
    );
}

#[test]
fn test_finishing_handler_in_output_chain_is_rejected() {
    let config = config_with("moduleOutputHandlers", &["classes.fixBaseClasses"]);
    let err = HandlerPipeline::resolve(&config, HandlerRegistry::builtin()).unwrap_err();
    assert!(matches!(
        err,
        BuildError::MisplacedHandler { expected: "output", .. }
    ));
}

#[test]
fn test_non_text_entry_is_rejected() {
    let mut config = Config::with_defaults();
    config.push_layer(ConfigLayer::new("test").with("methodHandlers", vec![SettingValue::Int(3)]));
    let err = HandlerPipeline::resolve(&config, HandlerRegistry::builtin()).unwrap_err();
    assert_eq!(
        err,
        BuildError::MalformedHandlerEntry {
            setting: "methodHandlers".to_string(),
            index: 0,
            found: "integer",
        }
    );
}

#[test]
fn test_builtin_names_are_registered() {
    let names = HandlerRegistry::builtin().names();
    for name in [
        "classes.fixBaseClasses",
        "classes.fixOverloadMethods",
        "classes.sortClassMethods",
        "classes.insertModifiers",
        "classes.fixCtor",
        "classes.fixPropMethods",
        "methods.insertModifiers",
        "methods.insertReturn",
        "common.simpleDocString",
        "common.simpleComments",
        "modules.ifMainScript",
        "output.stripTrailingWhitespace",
        "output.collapseBlankLines",
    ] {
        assert!(names.contains(&name), "missing {name}");
    }
}

// =============================================================================
// Finishing
// =============================================================================

#[test]
fn test_finish_runs_chain_once() {
    let mut registry = HandlerRegistry::new();
    registry.register("test.marker", Handler::Finish(append_marker));
    let mut config = Config::new();
    config.push_layer(ConfigLayer::new("test").with("classHandlers", vec![SettingValue::from("test.marker")]));
    let pipeline = HandlerPipeline::resolve(&config, &registry).unwrap();
    let settings = bare_settings();

    let mut tree = TemplateTree::new();
    let class = tree.alloc(TemplateNode::class("Box"));

    assert!(pipeline.finish(&mut tree, class, &settings).unwrap());
    assert!(!pipeline.finish(&mut tree, class, &settings).unwrap());
    assert_eq!(tree.children(class).len(), 1);
}

#[test]
fn test_handler_failure_names_handler_and_node() {
    let mut registry = HandlerRegistry::new();
    registry.register("test.fail", Handler::Finish(always_fail));
    let mut config = Config::new();
    config.push_layer(ConfigLayer::new("test").with("methodHandlers", vec![SettingValue::from("test.fail")]));
    let pipeline = HandlerPipeline::resolve(&config, &registry).unwrap();

    let mut tree = TemplateTree::new();
    let method = tree.alloc(TemplateNode::method("run"));
    let err = pipeline
        .finish(&mut tree, method, &bare_settings())
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::HandlerFailed {
            handler: "test.fail".to_string(),
            node: "method name:run".to_string(),
            message: "refused".to_string(),
        }
    );
}

// =============================================================================
// Built-in Handlers
// =============================================================================

#[test]
fn test_fix_base_classes() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let plain = tree.alloc(TemplateNode::class("Plain"));
    let derived = tree.alloc(TemplateNode::class("Derived"));
    tree.add_base(derived, "Base");

    classes::fix_base_classes(&mut tree, plain, &settings).unwrap();
    classes::fix_base_classes(&mut tree, derived, &settings).unwrap();

    let bases = |id: NodeId| match &tree.node(id).data {
        NodeData::Class { bases } => bases.clone(),
        _ => Vec::new(),
    };
    assert_eq!(bases(plain), vec!["object".to_string()]);
    assert_eq!(bases(derived), vec!["Base".to_string()]);
}

#[test]
fn test_fix_base_classes_rejects_other_kinds() {
    let mut tree = TemplateTree::new();
    let method = tree.alloc(TemplateNode::method("run"));
    assert!(classes::fix_base_classes(&mut tree, method, &bare_settings()).is_err());
}

#[test]
fn test_fix_overload_methods_marks_shared_names() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let class = tree.alloc(TemplateNode::class("Box"));
    let first = tree.append(class, TemplateNode::method("put"));
    let second = tree.append(class, TemplateNode::method("put"));
    let single = tree.append(class, TemplateNode::method("get"));

    classes::fix_overload_methods(&mut tree, class, &settings).unwrap();
    classes::fix_overload_methods(&mut tree, class, &settings).unwrap();

    let overloaded = vec![classes::OVERLOAD_DECORATOR.to_string()];
    assert_eq!(tree.node(first).preamble(), overloaded.as_slice());
    assert_eq!(tree.node(second).preamble(), overloaded.as_slice());
    assert!(tree.node(single).preamble().is_empty());
}

#[test]
fn test_sort_class_methods() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let class = tree.alloc(TemplateNode::class("Box"));
    let zeta = tree.append(class, TemplateNode::method("zeta"));
    let field = tree.add_line(class, "count = 0");
    let alpha = tree.append(class, TemplateNode::method("alpha"));

    classes::sort_class_methods(&mut tree, class, &settings).unwrap();

    assert_eq!(tree.children(class), &[field, alpha, zeta]);
}

#[test]
fn test_fix_ctor_renames_constructors_only() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    let class = tree.append(root, TemplateNode::class("Box"));
    let ctor = tree.append(class, TemplateNode::method("Box"));
    tree.add_parameter(ctor, "int", "size", &settings);
    let factory = tree.append(class, TemplateNode::method("Box"));
    tree.node_mut(factory).declared_type = Some("Box".to_string());

    classes::fix_ctor(&mut tree, class, &settings).unwrap();

    assert_eq!(tree.node(ctor).name.as_deref(), Some(classes::CONSTRUCTOR_NAME));
    assert_eq!(tree.node(factory).name.as_deref(), Some("Box"));
    assert!(
        tree.emit_to_string(root, &settings)
            .contains("    def __init__(self, size):\n"),
    );
    assert!(classes::fix_ctor(&mut tree, ctor, &settings).is_err());
}

fn accessor(tree: &mut TemplateTree, class: NodeId, name: &str, ty: Option<&str>, params: &[&str]) -> NodeId {
    let settings = bare_settings();
    let method = tree.append(class, TemplateNode::method(name));
    tree.node_mut(method).declared_type = ty.map(str::to_string);
    for param in params {
        tree.add_parameter(method, "int", param, &settings);
    }
    method
}

#[test]
fn test_fix_prop_methods_pairs_getter_and_setter() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    let class = tree.append(root, TemplateNode::class("Box"));
    let getter = accessor(&mut tree, class, "getSize", Some("int"), &[]);
    let setter = accessor(&mut tree, class, "setSize", Some("void"), &["size"]);
    tree.add_line(getter, "return self._size");
    tree.add_line(setter, "self._size = size");

    classes::fix_prop_methods(&mut tree, class, &settings).unwrap();

    assert_eq!(
        tree.emit_to_string(root, &settings),
        "class Box:\n\
         \x20   @property\n\
         \x20   def size(self):\n\
         \x20       return self._size\n\
         \n\
         \x20   @size.setter\n\
         \x20   def size(self, size):\n\
         \x20       self._size = size\n\
         \n"
    );
}

#[test]
fn test_fix_prop_methods_leaves_non_accessors() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let class = tree.alloc(TemplateNode::class("Box"));
    tree.add_variable(class, "count");
    let lone_setter = accessor(&mut tree, class, "setLabel", Some("void"), &["label"]);
    let void_getter = accessor(&mut tree, class, "getNothing", Some("void"), &[]);
    let with_args = accessor(&mut tree, class, "getItem", Some("int"), &["index"]);
    let shadowing = accessor(&mut tree, class, "getCount", Some("int"), &[]);
    let lowercase = accessor(&mut tree, class, "getaway", Some("int"), &[]);

    classes::fix_prop_methods(&mut tree, class, &settings).unwrap();

    for (method, name) in [
        (lone_setter, "setLabel"),
        (void_getter, "getNothing"),
        (with_args, "getItem"),
        (shadowing, "getCount"),
        (lowercase, "getaway"),
    ] {
        assert_eq!(tree.node(method).name.as_deref(), Some(name));
        assert!(tree.node(method).preamble().is_empty(), "{name}");
    }
}

#[test]
fn test_insert_return_makes_fall_through_explicit() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let class = tree.alloc(TemplateNode::class("Box"));
    let falls = accessor(&mut tree, class, "find", Some("int"), &[]);
    let body = tree.append(falls, TemplateNode::statement("if"));
    tree.set_header(body, Expression::text("found"));
    tree.add_line(body, "return 1");
    let returns = accessor(&mut tree, class, "size", Some("int"), &[]);
    tree.add_line(returns, "return self._size");
    let raises = accessor(&mut tree, class, "fail", Some("int"), &[]);
    tree.add_line(raises, "raise ValueError()");
    let void = accessor(&mut tree, class, "reset", Some("void"), &[]);
    tree.add_line(void, "self._size = 0");
    let empty = accessor(&mut tree, class, "area", Some("int"), &[]);

    for method in [falls, returns, raises, void, empty] {
        methods::insert_return(&mut tree, method, &settings).unwrap();
    }

    assert_eq!(tree.children(falls).len(), 2);
    assert!(matches!(
        &tree.node(tree.children(falls)[1]).data,
        NodeData::Line(text) if text == "return None"
    ));
    assert_eq!(tree.children(returns).len(), 1);
    assert_eq!(tree.children(raises).len(), 1);
    assert_eq!(tree.children(void).len(), 1);
    assert!(tree.children(empty).is_empty());
    assert!(methods::insert_return(&mut tree, class, &settings).is_err());
}

#[test]
fn test_simple_comments_strips_source_markers() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    let line = tree.add_comment(root, "// single line  ");
    let block = tree.add_comment(root, "/**\n * Holds a value.\n *\n * Not thread safe.\n */");

    common::simple_comments(&mut tree, line, &settings).unwrap();
    common::simple_comments(&mut tree, block, &settings).unwrap();

    assert_eq!(
        tree.emit_to_string(root, &settings),
        "## single line\n## Holds a value.\n## \n## Not thread safe.\n"
    );
    assert!(common::simple_comments(&mut tree, root, &settings).is_err());
}

#[test]
fn test_insert_modifiers_skips_decorators() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    let class = tree.append(root, TemplateNode::class("Box"));
    tree.add_modifier(class, "public", &settings);
    tree.add_modifier(class, "@Entity", &settings);
    tree.add_modifier(class, "final", &settings);

    common::insert_modifiers(&mut tree, class, &settings).unwrap();

    assert_eq!(
        tree.emit_to_string(root, &settings),
        "@Entity\nclass Box:\n    ## modifiers: public, final\n"
    );
}

#[test]
fn test_simple_doc_string_is_first_body_line() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    let class = tree.append(root, TemplateNode::class("Box"));
    tree.add_line(class, "size = 0");

    common::simple_doc_string(&mut tree, class, &settings).unwrap();

    assert_eq!(
        tree.emit_to_string(root, &settings),
        "class Box:\n    \"\"\" generated source for class Box \"\"\"\n    size = 0\n"
    );
}

#[test]
fn test_if_main_script_appends_entry_point() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    let class = tree.append(root, TemplateNode::class("App"));
    let main = tree.append(class, TemplateNode::method("main"));
    tree.add_modifier(main, "public", &settings);
    tree.add_modifier(main, "static", &settings);
    tree.node_mut(main).declared_type = Some("void".to_string());

    modules::if_main_script(&mut tree, root, &settings).unwrap();

    let text = tree.emit_to_string(root, &settings);
    assert!(
        text.ends_with("\nif __name__ == '__main__':\n    import sys\n    App.main(sys.argv)\n"),
        "{text}"
    );
}

#[test]
fn test_if_main_script_ignores_instance_main() {
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    let class = tree.append(root, TemplateNode::class("App"));
    let main = tree.append(class, TemplateNode::method("main"));
    tree.add_modifier(main, "public", &settings);

    modules::if_main_script(&mut tree, root, &settings).unwrap();

    assert_eq!(tree.children(root), &[class]);
}

#[test]
fn test_output_handlers() {
    let tree = TemplateTree::new();
    let id = NodeId(0);

    let stripped = output::strip_trailing_whitespace(&tree, id, "a = 1   \n\t\nb\n".to_string()).unwrap();
    assert_eq!(stripped, "a = 1\n\nb\n");

    let collapsed =
        output::collapse_blank_lines(&tree, id, "a\n\n\n\n\nb\n\n\n".to_string()).unwrap();
    assert_eq!(collapsed, "a\n\n\nb\n");
}

#[test]
fn test_render_applies_output_chain() {
    let config = Config::with_defaults();
    let pipeline = HandlerPipeline::resolve(&config, HandlerRegistry::builtin()).unwrap();
    let settings = bare_settings();
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    let stat = tree.append(root, TemplateNode::statement("while"));
    tree.set_header(stat, Expression::text("True"));
    tree.add_line(stat, "x = 1   ");
    for _ in 0..4 {
        tree.add_line(root, "");
    }

    assert_eq!(
        pipeline.render(&tree, root, &settings).unwrap(),
        "while True:\n    x = 1\n"
    );
}
