//! Configuration for a generation run. The layering (defaults, user file, local file, command-line
//! overrides) lives in the `generate` binary; this module only defines the shape.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The configuration that ships with csbind. Every key of [Config] has a value here.
pub const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

#[derive(Debug, Deserialize)]
pub struct Config {
    /// clang binary used to dump declarations and macros.
    pub clang: PathBuf,

    /// Directory containing the native headers.
    pub includes: PathBuf,

    /// Subdirectory of `includes` that `headers` are relative to. May be empty.
    #[serde(default)]
    pub header_prefix: String,

    /// Headers to parse, in emission order.
    pub headers: Vec<String>,

    /// Namespace of the generated C# files.
    pub namespace: String,

    /// Static partial class holding constants and external functions.
    pub class_name: String,

    /// Native library name passed to `DllImport`.
    pub library_name: String,

    /// Emit `public` declarations (`internal` otherwise).
    pub public_visibility: bool,

    /// Precede enums and their members with `/// <unmanaged>NAME</unmanaged>`.
    pub enum_unmanaged_tag: bool,

    pub collect: CollectConfig,
    pub types: TypesConfig,
    pub constants: ConstantsConfig,

    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

/// Filters applied by the collector.
#[derive(Debug, Deserialize)]
pub struct CollectConfig {
    /// Macro names ending with any of these (ignoring ASCII case) are include guards.
    pub header_guard_suffixes: Vec<String>,
    pub excluded_macros: Vec<String>,
    /// Structs that are written by hand next to the generated code.
    pub handwritten_structs: Vec<String>,
    /// Record-name suffix marking the target of an opaque handle typedef.
    pub opaque_suffix: String,
    #[serde(default)]
    pub excluded_functions: Vec<String>,

    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

/// Native name to C# name substitution.
#[derive(Clone, Debug, Deserialize)]
pub struct TypeMapping {
    pub native: String,
    pub managed: String,
}

#[derive(Debug, Deserialize)]
pub struct TypesConfig {
    /// Consulted before any structural resolution of a type.
    pub mappings: Vec<TypeMapping>,
    /// Boolean-like types that are replaced by an integer inside function pointer signatures.
    #[serde(default)]
    pub bool_like: Vec<TypeMapping>,
    /// Typedef names starting with one of these map to `nint`.
    #[serde(default)]
    pub handle_prefixes: Vec<String>,
    /// Enums that always get `[Flags]`.
    #[serde(default)]
    pub flag_enums: Vec<String>,
    /// Typedefs that are referenced by name instead of being resolved to their underlying type
    /// (because a hand-written C# type exists for them).
    #[serde(default)]
    pub keep_typedefs: Vec<String>,

    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ConstantsConfig {
    pub composite: Option<CompositeConstant>,
    #[serde(default)]
    pub overrides: Vec<ConstantOverride>,

    #[serde(flatten)]
    pub unknown: HashMap<String, Value>,
}

/// A macro emitted as `new {type_name}(tok[2], tok[4], tok[6], extra_args...)`.
#[derive(Debug, Deserialize)]
pub struct CompositeConstant {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Replaces the inferred type and value of one macro; emitted as `static readonly`.
#[derive(Debug, Deserialize)]
pub struct ConstantOverride {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
}

impl Config {
    /// Returns the default configuration, for use in tests.
    pub fn mock() -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .expect("default config must deserialize")
    }

    /// The visibility keyword for generated declarations.
    pub fn visibility(&self) -> &'static str {
        if self.public_visibility {
            "public"
        } else {
            "internal"
        }
    }

    /// Resolves `includes` against `base` when it is relative.
    pub fn includes_dir(&self, base: &Path) -> PathBuf {
        if self.includes.is_absolute() {
            self.includes.clone()
        } else {
            base.join(&self.includes)
        }
    }

    /// Full paths of every header to parse, in order.
    pub fn header_paths(&self, includes: &Path) -> Vec<PathBuf> {
        let dir = match self.header_prefix.as_str() {
            "" => includes.to_path_buf(),
            prefix => includes.join(prefix),
        };
        self.headers.iter().map(|h| dir.join(h)).collect()
    }

    /// Every unknown key, across all sections, with its dotted prefix.
    pub fn unknown_keys(&self) -> Vec<String> {
        let sections: [(&str, &HashMap<String, Value>); 4] = [
            ("", &self.unknown),
            ("collect", &self.collect.unknown),
            ("types", &self.types.unknown),
            ("constants", &self.constants.unknown),
        ];
        let mut keys: Vec<String> = sections
            .iter()
            .flat_map(|(prefix, unknown)| {
                unknown.keys().map(move |name| match *prefix {
                    "" => name.clone(),
                    p => format!("{p}.{name}"),
                })
            })
            .collect();
        keys.sort_unstable();
        keys
    }
}
