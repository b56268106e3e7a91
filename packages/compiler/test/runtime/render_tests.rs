/**
 * Runtime Render Tests
 *
 * Behaviour of the `attrs` helper on evaluated keyword arguments.
 */

#[cfg(test)]
mod tests {
    use giom_compiler::host::Value;
    use giom_compiler::runtime::{escape_html, render_attrs};
    use indexmap::IndexMap;

    fn s(value: &str) -> Value {
        Value::str(value)
    }

    #[test]
    fn should_render_nothing_for_no_attributes() {
        assert_eq!(render_attrs(&[]), "");
    }

    #[test]
    fn should_render_flags_as_bare_names() {
        let pairs = vec![(s("checked"), Value::Bool(true)), (s("value"), s("1"))];
        assert_eq!(render_attrs(&pairs), " checked value=\"1\"");
    }

    #[test]
    fn should_omit_falsy_values() {
        let pairs = vec![
            (s("a"), Value::Nil),
            (s("b"), Value::Bool(false)),
            (s("c"), Value::Int(0)),
            (s("d"), s("")),
            (s("e"), Value::Array(vec![])),
        ];
        assert_eq!(render_attrs(&pairs), "");
    }

    #[test]
    fn should_merge_repeated_names_in_first_seen_order() {
        let pairs = vec![
            (s("class"), s("a")),
            (s("title"), s("t")),
            (s("class"), Value::Array(vec![s("b"), Value::Nil, s("c")])),
        ];
        assert_eq!(render_attrs(&pairs), " class=\"a b c\" title=\"t\"");
    }

    #[test]
    fn should_expand_guard_keys() {
        let group = Value::KeyValueArray(vec![(s("role"), s("button")), (s("tabindex"), Value::Int(0))]);
        let on = vec![(Value::Bool(true), group.clone())];
        let off = vec![(Value::Bool(false), group)];
        assert_eq!(render_attrs(&on), " role=\"button\"");
        assert_eq!(render_attrs(&off), "");
    }

    #[test]
    fn should_expand_key_value_keys() {
        let pairs = vec![(
            Value::KeyValueArray(vec![(s("a"), s("1")), (s("b"), Value::Bool(true))]),
            Value::Bool(true),
        )];
        assert_eq!(render_attrs(&pairs), " a=\"1\" b");
    }

    #[test]
    fn should_filter_guarded_class_lists() {
        let classes = Value::KeyValueArray(vec![
            (Value::Bool(true), s("shown")),
            (Value::Nil, s("hidden")),
        ]);
        assert_eq!(render_attrs(&[(s("class"), classes)]), " class=\"shown\"");
    }

    #[test]
    fn should_render_style_dicts() {
        let mut style = IndexMap::new();
        style.insert("color".to_string(), s("red"));
        style.insert("margin".to_string(), Value::Nil);
        style.insert("width".to_string(), Value::Int(10));
        let pairs = vec![(s("style"), Value::Array(vec![Value::Dict(style), s("top:0")]))];
        assert_eq!(render_attrs(&pairs), " style=\"color:red; width:10; top:0\"");
    }

    #[test]
    fn should_escape_attribute_values() {
        let pairs = vec![(s("title"), s("\"quoted\" & 'single'"))];
        assert_eq!(
            render_attrs(&pairs),
            " title=\"&#34;quoted&#34; &amp; &#39;single&#39;\""
        );
    }

    #[test]
    fn should_escape_markup() {
        assert_eq!(escape_html("<b>"), "&lt;b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
