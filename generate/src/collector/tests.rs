use super::*;
use crate::test_util::{collect, enumeration, field, forward, function, header, record, typedef};
use csbind_core::config::Config;
use serde_json::json;

#[test]
fn macro_filters() {
    let collection = collect(
        vec![],
        "#define SDL_test_h_\n\
         #define SDL_TEST_H_ 1\n\
         #define SDL_EMPTY\n\
         #define SDL_SCANCODE_TO_KEYCODE(X) (X | SDLK_SCANCODE_MASK)\n\
         #define SDL_scancode_to_keycode 3\n\
         #define SDL_MIN(a, b) ((a) < (b) ? (a) : (b))\n\
         #define SDL_BUTTON_LEFT 1\n\
         #define SDL_IPHONE_MAX_GFORCE 5.0f\n",
    );
    let names: Vec<&str> = collection.constants.names().collect();
    assert_eq!(names, ["SDL_BUTTON_LEFT", "SDL_IPHONE_MAX_GFORCE"]);
}

#[test]
fn record_filters() {
    let collection = collect(
        vec![
            record(Some("SDL_Point"), "struct", vec![field("x", "int"), field("y", "int")]),
            record(Some("SDL_Empty"), "struct", vec![]),
            record(Some("VkInstance_T"), "struct", vec![field("x", "int")]),
            record(Some("VkTransformMatrixKHR"), "struct", vec![field("m", "float [3][4]")]),
            json!({
                "kind": "RecordDecl", "loc": c_ast::test_util::loc("/inc/SDL3/SDL_test.h"),
                "name": "Klass", "tagUsed": "class", "completeDefinition": true,
                "inner": [field("x", "int")]
            }),
            record(None, "struct", vec![field("x", "int")]),
            record(Some("SDL_Value"), "union", vec![field("i", "int"), field("f", "float")]),
        ],
        "",
    );
    let names: Vec<&str> = collection.records.names().collect();
    assert_eq!(names, ["SDL_Point", "SDL_Value"]);
    assert!(collection.handles.is_empty());
}

#[test]
fn handles() {
    let collection = collect(
        vec![
            forward("SDL_Window"),
            typedef("SDL_Window", "struct SDL_Window"),
            forward("VkInstance_T"),
            typedef("VkInstance", "struct VkInstance_T *"),
            forward("SDL_Defined"),
            record(Some("SDL_Defined"), "struct", vec![field("x", "int")]),
            typedef("SDL_DefinedPtr", "struct SDL_Defined *"),
        ],
        "",
    );
    let handles: Vec<(&str, &HandleKind)> = collection.handles.iter().collect();
    assert_eq!(
        handles,
        [
            ("SDL_Window", &HandleKind::Opaque),
            ("VkInstance", &HandleKind::Pointer)
        ]
    );
    let records: Vec<&str> = collection.records.names().collect();
    assert_eq!(records, ["SDL_Defined"]);
}

#[test]
fn enums_and_anonymous_members() {
    let collection = collect(
        vec![
            enumeration(Some("SDL_Flash"), &[("SDL_FLASH_CANCEL", 0), ("SDL_FLASH_BRIEFLY", 1)]),
            enumeration(None, &[("SDL_ANON_A", 4), ("SDL_ANON_B", -1), ("SDL_ANON_C", 1 << 40)]),
        ],
        "",
    );
    let enums: Vec<&str> = collection.enums.names().collect();
    assert_eq!(enums, ["SDL_Flash"]);
    let values: Vec<(&str, &str)> = collection
        .constants
        .iter()
        .map(|(name, def)| (name, def.value.as_str()))
        .collect();
    assert_eq!(
        values,
        [
            ("SDL_ANON_A", "4"),
            ("SDL_ANON_B", "-1"),
            ("SDL_ANON_C", "1099511627776L")
        ]
    );
}

#[test]
fn function_filters() {
    let mut config = Config::mock();
    config.collect.excluded_functions = vec!["SDL_Excluded".into()];
    let mut variadic = function("SDL_Log", "void (const char *, ...)", &[(Some("fmt"), "const char *")]);
    variadic["variadic"] = json!(true);
    let mut helper = function("SDL_Helper", "int (int)", &[(Some("x"), "int")]);
    helper["storageClass"] = json!("static");
    helper["inline"] = json!(true);
    let headers = [header(
        vec![
            function("SDL_Init", "bool (SDL_InitFlags)", &[(Some("flags"), "SDL_InitFlags")]),
            variadic,
            helper,
            function("SDL_Excluded", "void (void)", &[]),
            function("SDL_Quit", "void (void)", &[]),
        ],
        "",
    )];
    let collection = Collection::build(&config.collect, &headers);
    let names: Vec<&str> = collection.functions.names().collect();
    assert_eq!(names, ["SDL_Init", "SDL_Quit"]);
}

#[test]
fn duplicates_keep_first_occurrence() {
    let first = header(
        vec![record(Some("SDL_Point"), "struct", vec![field("x", "int")])],
        "#define SDL_BUTTON_LEFT 1\n",
    );
    let second = header(
        vec![record(Some("SDL_Point"), "struct", vec![field("y", "int")])],
        "#define SDL_BUTTON_LEFT 2\n",
    );
    let collection = Collection::build(&Config::mock().collect, &[first, second]);
    let (_, point) = collection.records.iter().next().unwrap();
    assert_eq!(point.fields[0].name, "x");
    assert_eq!(collection.records.len(), 1);
    let (_, left) = collection.constants.iter().next().unwrap();
    assert_eq!(left.value, "1");
}

#[test]
fn worklist_order() {
    let mut worklist = Worklist::default();
    assert!(worklist.push("b", 1));
    assert!(worklist.push("a", 2));
    assert!(!worklist.push("b", 3));
    assert_eq!(worklist.iter().collect::<Vec<_>>(), [("b", &1), ("a", &2)]);
}

#[test]
fn included_declarations_resolve_but_are_not_collected() {
    let sibling = header(
        vec![
            record(Some("SDL_Point"), "struct", vec![field("x", "int"), field("y", "int")]),
            forward("SDL_Window"),
            typedef("SDL_WindowID", "Uint32"),
        ],
        "",
    );
    let mut main = header(
        vec![
            record(Some("SDL_Line"), "struct", vec![field("a", "struct SDL_Point")]),
            function("SDL_GetWindowID", "SDL_WindowID (struct SDL_Window *)", &[(
                Some("window"),
                "struct SDL_Window *",
            )]),
        ],
        "",
    );
    main.included = sibling.decls;
    let collection = Collection::build(&Config::mock().collect, &[main]);
    assert_eq!(collection.records.names().collect::<Vec<_>>(), ["SDL_Line"]);
    assert!(collection.handles.is_empty());
    assert_eq!(collection.functions.names().collect::<Vec<_>>(), ["SDL_GetWindowID"]);
    assert!(collection.registry.record("SDL_Point").is_some());
    assert!(collection.registry.typedef("SDL_WindowID").is_some());
}
