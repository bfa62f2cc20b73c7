use super::*;
use crate::test_util::{forward, header, typedef};
use csbind_core::config::Config;

fn ty(text: &str) -> CType {
    text.parse().unwrap()
}

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::default();
    registry.register(&header(
        vec![
            typedef("Uint8", "uint8_t"),
            typedef("SDL_WindowID", "Uint32"),
            typedef("SDL_InitFlags", "Uint32"),
            typedef("SDL_Point", "struct SDL_Point"),
            typedef("SDL_CameraDeviceID", "Uint32"),
            typedef("SDL_AudioCallback", "void (*)(void *, Uint8 *, int)"),
            typedef("SDL_main_func", "int (int, char **)"),
            typedef("SDL_bool", "int"),
            typedef("SDL_LogOutput", "void (*)(void *, SDL_bool)"),
            typedef("va_list", "__builtin_va_list"),
            forward("VkInstance_T"),
            typedef("VkInstance", "struct VkInstance_T *"),
        ],
        "",
    ));
    registry
}

#[test]
fn table_entries_map_in_every_context() {
    let config = Config::mock();
    let registry = registry();
    let mapper = TypeMapper::new(&config.types, &registry);
    for mapping in &config.types.mappings {
        let native = CType::Typedef(mapping.native.clone());
        assert_eq!(mapper.map(&native).as_deref(), Some(mapping.managed.as_str()));
        let constant = CType::Qualified {
            qualifier: c_ast::ctype::Qualifier::Const,
            inner: Box::new(native.clone()),
        };
        assert_eq!(mapper.map(&constant).as_deref(), Some(mapping.managed.as_str()));
        let pointer = CType::Pointer(Box::new(native.clone()));
        assert_eq!(mapper.map(&pointer), Some(format!("{}*", mapping.managed)));
        let array = CType::Array {
            element: Box::new(native),
            size: Some(4),
        };
        assert_eq!(mapper.map(&array), Some(format!("{}*", mapping.managed)));
    }
}

#[test]
fn primitives() {
    let config = Config::mock();
    let registry = TypeRegistry::default();
    let mapper = TypeMapper::new(&config.types, &registry);
    let cases = [
        ("void", Some("void")),
        ("void *", Some("nint")),
        ("const void *", Some("void*")),
        ("void **", Some("nint*")),
        ("char", Some("sbyte")),
        ("const char *", Some("sbyte*")),
        ("char **", Some("sbyte**")),
        ("unsigned char", Some("byte")),
        ("signed char", Some("sbyte")),
        ("_Bool", Some("bool")),
        ("bool *", Some("bool*")),
        ("wchar_t", Some("ushort")),
        ("short", Some("short")),
        ("unsigned short", Some("ushort")),
        ("int", Some("int")),
        ("unsigned int", Some("uint")),
        ("long", Some("CLong")),
        ("unsigned long", Some("CULong")),
        ("long long", Some("long")),
        ("unsigned long long", Some("ulong")),
        ("float *", Some("float*")),
        ("double", Some("double")),
        ("long double", None),
        ("__int128", None),
    ];
    for (native, managed) in cases {
        assert_eq!(mapper.map(&ty(native)).as_deref(), managed, "{native}");
    }
}

#[test]
fn typedefs_enums_and_records() {
    let config = Config::mock();
    let registry = registry();
    let mapper = TypeMapper::new(&config.types, &registry);
    let cases = [
        ("SDL_WindowID", Some("uint")),
        ("const SDL_InitFlags", Some("uint")),
        ("Uint8 *", Some("byte*")),
        ("SDL_Point *", Some("SDL_Point*")),
        ("const struct SDL_Rect *", Some("SDL_Rect*")),
        ("enum SDL_Scancode", Some("SDL_Scancode")),
        ("SDL_CameraDeviceID *", Some("SDL_CameraDeviceID*")),
        ("VkInstance", Some("VkInstance")),
        ("PFN_vkVoidFunction", Some("nint")),
        ("va_list", None),
        ("Unknown", None),
    ];
    for (native, managed) in cases {
        assert_eq!(mapper.map(&ty(native)).as_deref(), managed, "{native}");
    }
}

#[test]
fn function_pointers() {
    let config = Config::mock();
    let registry = registry();
    let mapper = TypeMapper::new(&config.types, &registry);
    let cases = [
        ("SDL_AudioCallback", "delegate* unmanaged<nint, byte*, int, void>"),
        ("SDL_main_func *", "delegate* unmanaged<int, sbyte**, int>"),
        ("SDL_LogOutput", "delegate* unmanaged<nint, int, void>"),
        ("int (*)(VkBool32)", "delegate* unmanaged<uint, int>"),
        ("void (*)(long double)", "nint"),
        ("void (*)(const char *, ...)", "nint"),
    ];
    for (native, managed) in cases {
        assert_eq!(mapper.map(&ty(native)).as_deref(), Some(managed), "{native}");
    }
}

#[test]
fn fixed_buffer_types() {
    assert!(is_fixed_buffer_type("byte"));
    assert!(is_fixed_buffer_type("float"));
    assert!(!is_fixed_buffer_type("SDL_Point"));
    assert!(!is_fixed_buffer_type("nint"));
    assert!(!is_fixed_buffer_type("byte*"));
}

#[test]
fn keywords_are_escaped() {
    assert_eq!(identifier("string"), "@string");
    assert_eq!(identifier("params"), "@params");
    assert_eq!(identifier("window"), "window");
}
