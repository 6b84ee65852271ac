//! End-to-end event streams rendered through the full pipeline.

use j2py_common::{Config, parse_layer};
use j2py_emitter::{
    BuildError, BuildStack, Initializer, Modifier, ParamDecl, VariableDecl,
};

const PREAMBLE: &str = "#!/usr/bin/env python3\n# -*- coding: utf-8 -*-\n\n";

fn public() -> Vec<Modifier> {
    vec![Modifier::from("public")]
}

fn config_with(source: &str) -> Config {
    let mut config = Config::with_defaults();
    config.push_layer(parse_layer("test", source).unwrap());
    config
}

fn build_box(stack: &mut BuildStack) {
    stack.on_class("Box", &public(), &[], &[]);
    stack
        .on_method("getValue", Some("int"), &public(), &[], false)
        .unwrap();
    stack.on_variables(
        &[VariableDecl::new("result").init(Initializer::Expr("self.value".to_string()))],
        None,
    );
    stack.on_return(Some("result"));
    stack.pop().unwrap();
    stack.pop().unwrap();
}

#[test]
fn test_box_get_value() {
    let mut stack = BuildStack::new(&Config::with_defaults()).unwrap();
    build_box(&mut stack);

    let text = stack.finish().unwrap().render().unwrap();
    assert_eq!(
        text,
        format!(
            "{PREAMBLE}class Box:\n    def getValue(self):\n        result = self.value\n        return result\n"
        )
    );
}

#[test]
fn test_main_class_gets_script_entry_point() {
    let mut stack = BuildStack::new(&Config::with_defaults()).unwrap();
    stack.on_class("App", &public(), &[], &[]);
    let modifiers = vec![Modifier::from("public"), Modifier::from("static")];
    stack
        .on_method(
            "main",
            Some("void"),
            &modifiers,
            &[ParamDecl::new("String[]", "args")],
            false,
        )
        .unwrap();
    stack.on_expression("System.out.println(\"hi\")");
    stack.pop().unwrap();
    stack.pop().unwrap();

    let text = stack.finish().unwrap().render().unwrap();
    assert_eq!(
        text,
        format!(
            "{PREAMBLE}class App:\n    @classmethod\n    def main(cls, args):\n        print(\"hi\")\n\n\n\
             if __name__ == '__main__':\n    import sys\n    App.main(sys.argv)\n"
        )
    );
}

#[test]
fn test_user_layer_changes_layout_and_handlers() {
    let config = config_with(
        r##"{
            // two-space layout
            "indent": 2,
            "classHandlers": ["classes.fixBaseClasses"],
            "writeMethodDocString": true,
            "modulePreamble": ["# generated"],
        }"##,
    );
    let mut stack = BuildStack::new(&config).unwrap();
    build_box(&mut stack);

    let text = stack.finish().unwrap().render().unwrap();
    assert_eq!(
        text,
        format!(
            "{PREAMBLE}# generated\nclass Box(object):\n  def getValue(self):\n    \"\"\" generated source for method getValue \"\"\"\n    result = self.value\n    return result\n"
        )
    );
}

#[test]
fn test_user_output_substitution_runs_after_defaults() {
    let config = config_with(r#"{ "outputSubs": [["self\\.value", "self._value"]] }"#);
    let mut stack = BuildStack::new(&config).unwrap();
    build_box(&mut stack);

    let text = stack.finish().unwrap().render().unwrap();
    assert!(text.contains("result = self._value\n"), "{text}");
}

#[test]
fn test_unknown_handler_fails_before_building() {
    let config = config_with(r#"{ "methodHandlers": ["methods.doesNotExist"] }"#);
    let err = BuildStack::new(&config).unwrap_err();
    assert_eq!(
        err,
        BuildError::UnknownHandler {
            setting: "methodHandlers".to_string(),
            name: "methods.doesNotExist".to_string(),
        }
    );
}

#[test]
fn test_invalid_substitution_fails_before_building() {
    let config = config_with(r#"{ "outputSubs": [["[unclosed", "x"]] }"#);
    let err = BuildStack::new(&config).unwrap_err();
    assert!(matches!(err, BuildError::InvalidRewriteRule { .. }), "{err}");
}

#[test]
fn test_dump_tree() {
    let mut stack = BuildStack::new(&Config::with_defaults()).unwrap();
    build_box(&mut stack);

    let dump = stack.finish().unwrap().dump_tree();
    assert_eq!(
        dump,
        "module\n\
         \x20   class name:Box modifiers:public\n\
         \x20       method name:getValue type:int modifiers:public\n\
         \x20           parameter type:object name:self\n\
         \x20           line value:result = self.value\n\
         \x20           line value:return result\n"
    );
}

#[test]
fn test_constructor_and_accessors_become_init_and_property() {
    let config = config_with(
        r#"{
            "classHandlers": ["classes.fixPropMethods", "classes.sortClassMethods"],
            "methodHandlers": ["methods.insertReturn"],
        }"#,
    );
    let mut stack = BuildStack::new(&config).unwrap();
    stack.on_comment("/** A sized box. */").unwrap();
    stack.on_class("Box", &public(), &[], &[]);
    stack
        .on_method("Box", None, &public(), &[ParamDecl::new("int", "size")], false)
        .unwrap();
    stack.on_assign("=", "self.size_", "size");
    stack.pop().unwrap();
    stack
        .on_method("getSize", Some("int"), &public(), &[], false)
        .unwrap();
    stack.on_if("self.size_ > 0");
    stack.on_return(Some("self.size_"));
    stack.pop().unwrap();
    stack.pop().unwrap();
    stack.pop().unwrap();

    let text = stack.finish().unwrap().render().unwrap();
    assert_eq!(
        text,
        format!(
            "{PREAMBLE}## A sized box.\n\
             class Box:\n\
             \x20   def __init__(self, size):\n\
             \x20       self.size_ = size\n\
             \n\
             \x20   @property\n\
             \x20   def size(self):\n\
             \x20       if self.size_ > 0:\n\
             \x20           return self.size_\n\
             \x20       return None\n"
        )
    );
}
