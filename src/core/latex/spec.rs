//! Command specification for math regions
//!
//! mitex's default command table, extended with the equation-numbering
//! macros so that `\tag` is parsed together with its argument.

use fxhash::FxHashMap;
use lazy_static::lazy_static;
use mitex_parser::CommandSpec;
use mitex_spec::preludes::command::define_command;
use mitex_spec_gen::DEFAULT_SPEC;
use phf::phf_set;

/// Macros that end a logical line inside an aligned environment
pub static LINE_BREAK_MACROS: phf::Set<&'static str> = phf_set! {
    "\\",
    "newline",
};

/// Macros that suppress the number of the current line
pub static NO_TAG_MACROS: phf::Set<&'static str> = phf_set! {
    "notag",
    "nonumber",
};

/// The equation tag macro
pub const TAG_MACRO: &str = "tag";

/// Environments in which every line gets its own number
pub const DEFAULT_ALIGNED_ENVIRONMENTS: &[&str] = &["align", "alignat", "gather"];

lazy_static! {
    /// mitex's default table plus `\tag`, `\tag*`, `\notag`, `\nonumber`
    /// and `\newline`
    pub static ref TAG_SPEC: CommandSpec = {
        let mut commands: FxHashMap<String, _> = DEFAULT_SPEC
            .items()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();

        commands.insert(TAG_MACRO.to_string(), define_command(1));
        commands.insert(format!("{}*", TAG_MACRO), define_command(1));
        for name in NO_TAG_MACROS.iter() {
            commands.insert(name.to_string(), define_command(0));
        }
        commands.insert("newline".to_string(), define_command(0));

        CommandSpec::new(commands)
    };
}

pub fn is_line_break(name: &str) -> bool {
    LINE_BREAK_MACROS.contains(name)
}

pub fn is_no_tag(name: &str) -> bool {
    NO_TAG_MACROS.contains(name)
}

/// `tag` or `tag*`
pub fn is_tag(name: &str) -> bool {
    name.strip_suffix('*').unwrap_or(name) == TAG_MACRO
}
