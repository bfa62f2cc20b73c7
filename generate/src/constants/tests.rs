use super::*;
use crate::registry::TypeRegistry;
use crate::test_util::{header, typedef};
use csbind_core::config::ConstantOverride;

fn tokens(text: &str) -> Vec<String> {
    c_ast::macros::tokenize(text)
}

#[test]
fn normalization() {
    assert_eq!(normalize(&tokens("((-32768))")), "-32768");
    assert_eq!(normalize(&tokens("(SDL_HAT_RIGHT | SDL_HAT_UP)")), "SDL_HAT_RIGHT|SDL_HAT_UP");
    assert_eq!(normalize(&tokens("(a) | (b)")), "(a)|(b)");
    assert_eq!(normalize(&tokens("0xFFFFFFFFFFFFFFFFULL")), "0xFFFFFFFFFFFFFFFFUL");
    assert_eq!(normalize(&tokens("1000000000LL")), "1000000000L");
}

#[test]
fn inference() {
    let cases = [
        ("5.0f", Some("float")),
        ("9.80665F", Some("float")),
        ("0x7F", Some("uint")),
        ("0xFFFFFFFFFFFFFFFFUL", Some("ulong")),
        ("1000000000UL", Some("ulong")),
        ("0x00000010u", Some("uint")),
        ("1000000000L", Some("long")),
        ("128", Some("uint")),
        ("-32768", Some("int")),
        ("1.5", Some("double")),
        ("1<<30", Some("int")),
        ("SDL_HAT_RIGHT|SDL_HAT_UP", None),
        ("SDL_SELF", None),
    ];
    for (value, ty) in cases {
        assert_eq!(infer_type(value), ty, "{value}");
    }
}

fn declarations(config: &Config, registry: &TypeRegistry, defines: &[(&str, &str)]) -> Vec<String> {
    let mapper = TypeMapper::new(&config.types, registry);
    let defs: Vec<MacroDef> = defines
        .iter()
        .map(|(name, value)| MacroDef::new(*name, *value))
        .collect();
    let file = ConstantsEmitter::new(config, &mapper)
        .emit(defs.iter().map(|def| (def.name.as_str(), def)));
    file.contents()
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("public ") && !line.contains(" class "))
        .map(str::to_string)
        .collect()
}

#[test]
fn declarations_by_kind() {
    let config = Config::mock();
    let mut registry = TypeRegistry::default();
    registry.register(&header(
        vec![
            typedef("SDL_AudioDeviceID", "Uint32"),
            typedef("SDL_CameraDeviceID", "Uint32"),
        ],
        "",
    ));
    let lines = declarations(
        &config,
        &registry,
        &[
            ("SDL_IPHONE_MAX_GFORCE", "5.0f"),
            ("SDL_MAX_UINT64", "0xFFFFFFFFFFFFFFFFULL"),
            ("SDL_HAT_RIGHT", "0x02"),
            ("SDL_HAT_UP", "0x01"),
            ("SDL_HAT_RIGHTUP", "(SDL_HAT_RIGHT|SDL_HAT_UP)"),
            ("SDL_JOYSTICK_AXIS_MIN", "(-32768)"),
            ("SDL_PROP_JOYSTICK_CAP_RUMBLE_BOOLEAN", "\"SDL.joystick.cap.rumble\""),
            ("SDL_PROP_GAMEPAD_CAP_RUMBLE_BOOLEAN", "SDL_PROP_JOYSTICK_CAP_RUMBLE_BOOLEAN"),
            ("SDL_AUDIO_DEVICE_DEFAULT_OUTPUT", "((SDL_AudioDeviceID) 0xFFFFFFFFu)"),
            ("SDL_CAMERA_DEFAULT", "((SDL_CameraDeviceID) 0)"),
            ("SDL_PLATFORM", "SDL_GetPlatform()"),
            ("SDL_MAJOR_VERSION", "3"),
            (
                "SDL_VERSION",
                "SDL_VERSIONNUM(SDL_MAJOR_VERSION, SDL_MINOR_VERSION, SDL_MICRO_VERSION)",
            ),
        ],
    );
    assert_eq!(
        lines,
        [
            "public const float SDL_IPHONE_MAX_GFORCE = 5.0f;",
            "public const ulong SDL_MAX_UINT64 = 0xFFFFFFFFFFFFFFFFUL;",
            "public const uint SDL_HAT_RIGHT = 0x02;",
            "public const uint SDL_HAT_UP = 0x01;",
            "public const uint SDL_HAT_RIGHTUP = SDL_HAT_RIGHT|SDL_HAT_UP;",
            "public const int SDL_JOYSTICK_AXIS_MIN = -32768;",
            "public static ReadOnlySpan<byte> SDL_PROP_JOYSTICK_CAP_RUMBLE_BOOLEAN => \"SDL.joystick.cap.rumble\"u8;",
            "public static ReadOnlySpan<byte> SDL_PROP_GAMEPAD_CAP_RUMBLE_BOOLEAN => SDL_PROP_JOYSTICK_CAP_RUMBLE_BOOLEAN;",
            "public const uint SDL_AUDIO_DEVICE_DEFAULT_OUTPUT = (uint)0xFFFFFFFFu;",
            "public static readonly SDL_CameraDeviceID SDL_CAMERA_DEFAULT = (SDL_CameraDeviceID)0;",
            "public const string SDL_PLATFORM = \"SDL_GetPlatform()\";",
            "public const uint SDL_MAJOR_VERSION = 3;",
            "public static readonly SDLVersion SDL_VERSION = new SDLVersion(SDL_MAJOR_VERSION, SDL_MINOR_VERSION, SDL_MICRO_VERSION);",
        ]
    );
}

#[test]
fn unmanaged_tags_and_overrides() {
    let mut config = Config::mock();
    config.constants.overrides.push(ConstantOverride {
        name: "SDL_NS_PER_SECOND".into(),
        ty: "ulong".into(),
        value: "1000000000UL".into(),
    });
    let registry = TypeRegistry::default();
    let mapper = TypeMapper::new(&config.types, &registry);
    let def = MacroDef::new("SDL_NS_PER_SECOND", "SDL_SINT64_C(1000000000)");
    let file = ConstantsEmitter::new(&config, &mapper).emit([("SDL_NS_PER_SECOND", &def)].into_iter());
    assert!(file.contents().contains(
        "\t/// <unmanaged>SDL_NS_PER_SECOND</unmanaged>\n\
         \tpublic static readonly ulong SDL_NS_PER_SECOND = 1000000000UL;\n"
    ));
    assert!(file.contents().contains("public static partial class SDL\n{\n"));
}

#[test]
fn composite_needs_three_arguments() {
    let config = Config::mock();
    let registry = TypeRegistry::default();
    let mapper = TypeMapper::new(&config.types, &registry);
    let emitter = ConstantsEmitter::new(&config, &mapper);
    assert_eq!(emitter.constant(&MacroDef::new("SDL_VERSION", "SDL_VERSIONNUM(3)")), None);
}
