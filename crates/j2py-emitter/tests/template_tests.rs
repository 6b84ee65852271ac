use super::*;
use crate::settings::EmitSettings;

fn bare_settings() -> EmitSettings {
    let mut settings = EmitSettings::defaults();
    settings.module_preamble.clear();
    settings.module_epilogue.clear();
    settings
}

fn tree_with_root() -> (TemplateTree, NodeId) {
    let mut tree = TemplateTree::new();
    let root = tree.alloc(TemplateNode::module());
    (tree, root)
}

#[test]
fn test_kind_names_round_trip() {
    for kind in NodeKind::ALL {
        assert_eq!(NodeKind::from_name(kind.name()), Some(kind));
    }
    assert_eq!(NodeKind::from_name("Class"), Some(NodeKind::Class));
    assert_eq!(NodeKind::from_name("switch"), None);
    assert_eq!(NodeKind::Class.config_key("Handlers"), "classHandlers");
    assert_eq!(NodeKind::Module.config_key("OutputHandlers"), "moduleOutputHandlers");
}

#[test]
fn test_add_child_records_parent_and_order() {
    let (mut tree, root) = tree_with_root();
    let first = tree.add_line(root, "a = 1");
    let second = tree.add_line(root, "b = 2");
    let inserted = tree.alloc(TemplateNode::comment("head"));
    tree.insert_child(root, 0, inserted);

    assert_eq!(tree.children(root), &[inserted, first, second]);
    assert_eq!(tree.parent(first), Some(root));
    assert_eq!(tree.parent(root), None);
}

#[test]
fn test_ancestors_and_declared_names() {
    let (mut tree, root) = tree_with_root();
    let class = tree.append(root, TemplateNode::class("Box"));
    let stat = tree.append(class, TemplateNode::statement("while"));
    tree.add_variable(class, "count");

    assert_eq!(tree.ancestors(stat).collect::<Vec<_>>(), vec![class, root]);
    assert!(tree.is_declared(stat, "count"));
    assert!(!tree.is_declared(root, "count"));
}

#[test]
fn test_empty_class_renders_pass() {
    let settings = bare_settings();
    let (mut tree, root) = tree_with_root();
    tree.append(root, TemplateNode::class("Box"));

    assert_eq!(tree.emit_to_string(root, &settings), "class Box:\n    pass\n");
}

#[test]
fn test_class_bases_and_decorators() {
    let settings = bare_settings();
    let (mut tree, root) = tree_with_root();
    let class = tree.append(root, TemplateNode::class("Box"));
    tree.add_modifier(class, "public", &settings);
    tree.add_modifier(class, "@dataclass", &settings);
    tree.add_base(class, "Base");
    tree.add_base(class, "Sized");
    tree.add_line(class, "value = 0");

    assert_eq!(
        tree.emit_to_string(root, &settings),
        "@dataclass\nclass Box(Base, Sized):\n    value = 0\n"
    );
}

#[test]
fn test_statement_header_and_nested_body() {
    let settings = bare_settings();
    let (mut tree, root) = tree_with_root();
    let stat = tree.append(root, TemplateNode::statement("while"));
    tree.set_header(stat, Expression::text("i < 10"));
    tree.add_line(stat, "i += 1");
    let inner = tree.append(stat, TemplateNode::statement("else"));
    tree.add_line(inner, "break");

    assert_eq!(
        tree.emit_to_string(root, &settings),
        "while i < 10:\n    i += 1\n    else:\n        break\n"
    );
}

#[test]
fn test_statement_without_header() {
    let settings = bare_settings();
    let (mut tree, root) = tree_with_root();
    tree.append(root, TemplateNode::statement("try"));

    assert_eq!(tree.emit_to_string(root, &settings), "try:\n    pass\n");
}

#[test]
fn test_block_is_transparent() {
    let settings = bare_settings();
    let (mut tree, root) = tree_with_root();
    let block = tree.append(root, TemplateNode::block());
    tree.add_line(block, "x = 0");
    tree.append(root, TemplateNode::block());

    assert_eq!(tree.emit_to_string(root, &settings), "x = 0\n");
}

#[test]
fn test_module_preamble_and_epilogue() {
    let mut settings = bare_settings();
    settings.module_preamble = vec!["# header".to_string(), String::new()];
    settings.module_epilogue = vec!["# footer".to_string()];
    let (mut tree, root) = tree_with_root();
    tree.add_line(root, "x = 1");

    assert_eq!(
        tree.emit_to_string(root, &settings),
        "# header\n\nx = 1\n# footer\n"
    );
}

#[test]
fn test_comment_uses_prefix() {
    let mut settings = bare_settings();
    settings.comment_prefix = "# ".to_string();
    let (mut tree, root) = tree_with_root();
    let class = tree.append(root, TemplateNode::class("Box"));
    tree.add_comment(class, "note");

    assert_eq!(tree.emit_to_string(root, &settings), "class Box:\n    # note\n");
}

#[test]
fn test_blank_lines_carry_no_indent() {
    let settings = bare_settings();
    let (mut tree, root) = tree_with_root();
    let class = tree.append(root, TemplateNode::class("Box"));
    tree.add_line(class, "a = 1");
    tree.add_line(class, "");
    tree.add_line(class, "b = 2");

    assert_eq!(
        tree.emit_to_string(root, &settings),
        "class Box:\n    a = 1\n\n    b = 2\n"
    );
}

#[test]
fn test_indent_width_setting() {
    let mut settings = bare_settings();
    settings.indent_unit = "  ".to_string();
    let (mut tree, root) = tree_with_root();
    let class = tree.append(root, TemplateNode::class("Box"));
    tree.add_line(class, "a = 1");

    assert_eq!(tree.emit_to_string(root, &settings), "class Box:\n  a = 1\n");
}

#[test]
fn test_describe_is_debug_text() {
    let settings = bare_settings();
    let (mut tree, root) = tree_with_root();
    let class = tree.append(root, TemplateNode::class("Box"));
    tree.add_modifier(class, "public", &settings);
    tree.node_mut(class).declared_type = Some("Box".to_string());

    assert_eq!(tree.describe(class), "class name:Box type:Box modifiers:public");
    assert_eq!(tree.describe(root), "module");
}

#[test]
fn test_dump_repr_lists_subtree() {
    let settings = bare_settings();
    let (mut tree, root) = tree_with_root();
    let class = tree.append(root, TemplateNode::class("Box"));
    let method = tree.append(class, TemplateNode::method("size"));
    tree.add_parameter(method, "int", "limit", &settings);

    let dump = tree.dump_repr(root);
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(
        lines,
        vec![
            "module",
            "    class name:Box",
            "        method name:size",
            "            parameter type:object name:self",
            "            parameter type:int name:limit",
        ]
    );
}

#[test]
fn test_mark_finished_once() {
    let (mut tree, root) = tree_with_root();
    assert!(!tree.node(root).is_finished());
    assert!(tree.mark_finished(root));
    assert!(!tree.mark_finished(root));
    assert!(tree.node(root).is_finished());
}

#[test]
fn test_configured_lookups_use_kind_keyed_settings() {
    use j2py_common::{Config, ConfigLayer, SettingValue};

    let mut config = Config::new();
    config.push_layer(
        ConfigLayer::new("base")
            .with("classHandlers", SettingValue::from(vec![SettingValue::from("a")]))
            .with("classIndent", SettingValue::Int(2)),
    );
    config.push_layer(
        ConfigLayer::new("user")
            .with("classHandlers", SettingValue::from(vec![SettingValue::from("b")]))
            .with("classIndent", SettingValue::Int(8)),
    );

    let (mut tree, root) = tree_with_root();
    let class = tree.alloc(TemplateNode::class("Box"));
    tree.add_child(root, class);

    assert_eq!(
        tree.configured_handlers(class, &config, "Handlers"),
        vec![SettingValue::from("a"), SettingValue::from("b")]
    );
    assert_eq!(
        tree.configured_value(class, &config, "Indent"),
        Some(&SettingValue::Int(8))
    );
    assert!(tree.configured_handlers(root, &config, "Handlers").is_empty());
}
