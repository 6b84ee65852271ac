//! Built-in default configuration layer.
//!
//! The default layer is always the base of a [`crate::Config`] created with
//! [`crate::Config::with_defaults`]. User layers override its scalars and
//! extend its lists and maps.

use crate::config::{ConfigLayer, SettingValue};
use crate::limits::{
    DEFAULT_COMMENT_PREFIX, DEFAULT_INDENT_WIDTH, DEFAULT_MIN_INDENT_PARAMS,
    DEFAULT_TYPE_BOUND_DECORATOR,
};

/// Setting names understood by the translator.
pub mod keys {
    // Scalars
    pub const INDENT: &str = "indent";
    pub const COMMENT_PREFIX: &str = "commentPrefix";
    pub const MIN_INDENT_PARAMS: &str = "minIndentParams";
    pub const WRITE_MODIFIERS_COMMENTS: &str = "writeModifiersComments";
    pub const WRITE_METHOD_DOC_STRING: &str = "writeMethodDocString";
    pub const METHOD_PREAMBLE_SORTER: &str = "methodPreambleSorter";
    pub const TYPE_BOUND_DECORATOR: &str = "typeBoundDecorator";

    // Lists
    pub const MODULE_PREAMBLE: &str = "modulePreamble";
    pub const MODULE_EPILOGUE: &str = "moduleEpilogue";
    pub const OUTPUT_SUBS: &str = "outputSubs";

    // Maps
    pub const TYPE_TYPE_MAP: &str = "typeTypeMap";
    pub const TYPE_VALUE_MAP: &str = "typeValueMap";
    pub const RENAME_METHOD_MAP: &str = "renameMethodMap";
    pub const RENAME_ANY_MAP: &str = "renameAnyMap";
    pub const MODIFIER_DECORATOR_MAP: &str = "modifierDecoratorMap";
    pub const VARIABLE_NAME_MAPPING: &str = "variableNameMapping";
    pub const EXCEPTION_TYPE_MAPPING: &str = "exceptionTypeMapping";

    // Handler chain categories, appended to a node kind name
    // (`class` + `Handlers` = `classHandlers`).
    pub const HANDLERS: &str = "Handlers";
    pub const OUTPUT_HANDLERS: &str = "OutputHandlers";
}

/// Target-language keywords that cannot be used as identifiers.
const RESERVED_WORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Builtins that a translated local would shadow.
const SHADOWED_BUILTINS: &[&str] = &[
    "abs", "all", "any", "bool", "bytes", "callable", "chr", "dict", "dir", "divmod",
    "enumerate", "filter", "float", "format", "hash", "hex", "id", "input", "int", "isinstance",
    "iter", "len", "list", "map", "max", "min", "next", "object", "oct", "open", "ord", "pow",
    "print", "range", "repr", "reversed", "round", "set", "sorted", "str", "sum", "super",
    "tuple", "type", "vars", "zip",
];

/// The layer every default configuration starts from.
pub fn default_layer() -> ConfigLayer {
    ConfigLayer::new("<defaults>")
        .with(keys::INDENT, DEFAULT_INDENT_WIDTH as i64)
        .with(keys::COMMENT_PREFIX, DEFAULT_COMMENT_PREFIX)
        .with(keys::MIN_INDENT_PARAMS, DEFAULT_MIN_INDENT_PARAMS as i64)
        .with(keys::WRITE_MODIFIERS_COMMENTS, false)
        .with(keys::WRITE_METHOD_DOC_STRING, false)
        .with(keys::TYPE_BOUND_DECORATOR, DEFAULT_TYPE_BOUND_DECORATOR)
        .with(
            keys::MODULE_PREAMBLE,
            texts(&["#!/usr/bin/env python3", "# -*- coding: utf-8 -*-", ""]),
        )
        .with(keys::MODULE_EPILOGUE, texts(&[]))
        .with(keys::OUTPUT_SUBS, pairs(OUTPUT_SUBS))
        .with(
            keys::TYPE_TYPE_MAP,
            map(&[
                ("String", "str"),
                ("Integer", "int"),
                ("Long", "int"),
                ("Object", "object"),
                ("int", "int"),
                ("long", "int"),
                ("short", "int"),
                ("byte", "int"),
                ("double", "float"),
                ("float", "float"),
                ("Double", "float"),
                ("Vector", "list"),
                ("ArrayList", "list"),
                ("List", "list"),
                ("HashMap", "dict"),
                ("Map", "dict"),
                ("boolean", "bool"),
                ("Boolean", "bool"),
                ("char", "str"),
                ("[", "list"),
            ]),
        )
        .with(
            keys::TYPE_VALUE_MAP,
            map(&[
                ("String", "\"\""),
                ("int", "0"),
                ("long", "0"),
                ("short", "0"),
                ("byte", "0"),
                ("double", "0.0"),
                ("float", "0.0"),
                ("Vector", "[]"),
                ("ArrayList", "[]"),
                ("List", "[]"),
                ("HashMap", "{}"),
                ("Map", "{}"),
                ("boolean", "False"),
                ("str", "\"\""),
                ("[", "None"),
            ]),
        )
        .with(keys::RENAME_METHOD_MAP, {
            let mut entries = vec![("equals".to_string(), "__eq__".to_string())];
            entries.extend(suffixed(&["and", "del", "elif", "from", "in", "is", "not", "or", "print"]));
            owned_map(entries)
        })
        .with(keys::RENAME_ANY_MAP, {
            let mut entries: Vec<(String, String)> = [
                ("this", "self"),
                ("null", "None"),
                ("false", "False"),
                ("true", "True"),
                ("str", "strval"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
            entries.extend(suffixed(&["and", "del", "elif", "from", "in", "is", "not", "or", "print"]));
            owned_map(entries)
        })
        .with(
            keys::MODIFIER_DECORATOR_MAP,
            map(&[
                ("synchronized", "@synchronized(mlock)"),
                ("static", DEFAULT_TYPE_BOUND_DECORATOR),
            ]),
        )
        .with(
            keys::VARIABLE_NAME_MAPPING,
            owned_map(
                suffixed(RESERVED_WORDS)
                    .chain(suffixed(SHADOWED_BUILTINS))
                    .collect(),
            ),
        )
        .with(
            keys::EXCEPTION_TYPE_MAPPING,
            map(&[
                ("NoSuchFieldError", "AttributeError"),
                ("NoSuchMethodException", "AttributeError"),
            ]),
        )
        .with("classHandlers", texts(&["classes.fixCtor"]))
        .with("commentHandlers", texts(&["common.simpleComments"]))
        .with("methodHandlers", texts(&[]))
        .with("statementHandlers", texts(&[]))
        .with("moduleHandlers", texts(&["modules.ifMainScript"]))
        .with(
            "moduleOutputHandlers",
            texts(&["output.stripTrailingWhitespace", "output.collapseBlankLines"]),
        )
}

/// Regex substitutions applied to the rendered program, in order.
/// Replacements use `${n}` group references.
const OUTPUT_SUBS: &[(&str, &str)] = &[
    (r"\.self\.", "."),
    (r"String\.valueOf\((.*?)\)", "str(${1})"),
    (r"System\.out\.println\((.*)\)", "print(${1})"),
    (r"System\.out\.print_?\((.*?)\)", "print(${1}, end='')"),
    (r"(.*?)\.equals\((.*?)\)", "${1} == ${2}"),
    (r"(.*?)\.equalsIgnoreCase\((.*?)\)", "${1}.lower() == ${2}.lower()"),
    (r"([\w.]+)\.size\(\)", "len(${1})"),
    (r"(\w+)\.get\((.*?)\)", "${1}[${2}]"),
    (r"(\s)(\S*?)(\.toString\(\))", "${1}str(${2})"),
    (r"(\s)(\S*?)(\.toLowerCase\(\))", "${1}${2}.lower()"),
    (r"(\s)(\S*?)(\.length\(\))", "${1}len(${2})"),
    (r"(.*?)IndexOutOfBoundsException\((.*?)\)", "${1}IndexError(${2})"),
];

fn texts(items: &[&str]) -> SettingValue {
    SettingValue::List(items.iter().map(|&item| item.into()).collect())
}

fn pairs(items: &[(&str, &str)]) -> SettingValue {
    SettingValue::List(
        items
            .iter()
            .map(|&(key, value)| SettingValue::List(vec![key.into(), value.into()]))
            .collect(),
    )
}

fn map(entries: &[(&str, &str)]) -> SettingValue {
    owned_map(
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    )
}

fn owned_map(entries: Vec<(String, String)>) -> SettingValue {
    SettingValue::Map(
        entries
            .into_iter()
            .map(|(key, value)| (key, SettingValue::Text(value)))
            .collect(),
    )
}

/// `word` -> `word_` for each word.
fn suffixed(words: &[&str]) -> impl Iterator<Item = (String, String)> {
    words.iter().map(|word| (word.to_string(), format!("{word}_")))
}
