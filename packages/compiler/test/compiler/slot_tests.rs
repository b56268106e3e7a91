/**
 * Slot Protocol Tests
 *
 * Slot definitions and usage sites inside comps, and the slot maps built
 * at comp call sites.
 */

#[allow(dead_code)]
#[path = "../util/mod.rs"]
mod util;

#[cfg(test)]
mod tests {
    use super::util::body;

    fn assert_in_order(haystack: &str, needles: &[&str]) {
        let mut from = 0;
        for needle in needles {
            match haystack[from..].find(needle) {
                Some(offset) => from += offset + needle.len(),
                None => panic!("{:?} not found in order in:\n{}", needle, haystack),
            }
        }
    }

    #[test]
    fn should_define_and_use_slots() {
        assert_eq!(
            body("@comp card\n  div\n    @slot body(x)\n      p default"),
            "{% const card = func(;$slots={}) %}\
             {% const $slot$body$ = func(default_slot, x) %}<p>{% giom$write(\"default\") %}</p>{% end %}\
             {% var $slot$body = $slots[\"body\"] ?? $slot$body$ %}\
             <div>{% $slot$body($slot$body$, x) %}</div>{% end %}"
        );
    }

    #[test]
    fn should_forward_named_slot_params_with_defaults() {
        assert_eq!(
            body("@comp list\n  @slot item(x; k=1)"),
            "{% const list = func(;$slots={}) %}\
             {% const $slot$item$ = func(default_slot, x; k=nil) %}{% end %}\
             {% var $slot$item = $slots[\"item\"] ?? $slot$item$ %}\
             {% $slot$item($slot$item$, x; k=1) %}{% end %}"
        );
    }

    #[test]
    fn should_define_slots_with_dashed_names() {
        let out = body("@comp card\n  @slot card-body");
        assert_in_order(
            &out,
            &[
                "{% const $slot$card__body$ = func(default_slot) %}",
                "{% var $slot$card__body = $slots[\"card-body\"] ?? $slot$card__body$ %}",
                "{% $slot$card__body($slot$card__body$) %}",
            ],
        );
    }

    #[test]
    fn should_wrap_slots() {
        assert_eq!(
            body("@comp card\n  @slot body\n    @wrap\n      section\n        ~ slot()\n    p default"),
            "{% const card = func(;$slots={}) %}\
             {% const $slot$body$ = func(default_slot) %}<p>{% giom$write(\"default\") %}</p>{% end %}\
             {% const $slot$body$wrap = func(slot$) %}\
             {% return func(*args, **kwargs) %}\
             {% const (user_slot = $slots[\"body\"]) %}\
             {% const slot = (*a, **kw) => slot$(*args, *a, **kwargs, **kw) %}\
             <section>{% slot(); %}</section>\
             {% end %}{% end %}\
             {% var $slot$body = $slot$body$wrap($slots[\"body\"] ?? $slot$body$) %}\
             {% $slot$body($slot$body$) %}{% end %}"
        );
    }

    #[test]
    fn should_forward_usage_arguments_through_wrap_accessor() {
        let out = body("@comp list\n  @slot row(x)\n    @wrap\n      li\n        ~ slot()");
        assert_in_order(
            &out,
            &[
                "{% const $slot$row$ = func(default_slot, x) %}{% end %}",
                "{% const $slot$row$wrap = func(slot$) %}{% return func(*args, **kwargs) %}",
                "{% const slot = (*a, **kw) => slot$(*args, *a, **kwargs, **kw) %}",
                "<li>{% slot(); %}</li>",
                "{% var $slot$row = $slot$row$wrap($slots[\"row\"] ?? $slot$row$) %}",
                "{% $slot$row($slot$row$, x) %}",
            ],
        );
        assert!(!out.contains("(*args, **kwargs) => slot$"));
    }

    #[test]
    fn should_pass_slots_at_call_site() {
        assert_eq!(
            body("+card\n  @slot #body(x)\n    p over"),
            "{% do %}\
             {% const $$slot$1 = func(default_slot, x) %}<p>{% giom$write(\"over\") %}</p>{% end %}\
             {% var $$slots$2 = {}; $$slots$2[\"body\"] = $$slot$1; %}\
             {% card(;$slots=$$slots$2) %}{% end %}"
        );
    }

    #[test]
    fn should_pass_remaining_content_as_main() {
        assert_eq!(
            body("+card(1)\n  p content"),
            "{% do %}\
             {% const $$slot$1 = func(*args; **kwargs) %}<p>{% giom$write(\"content\") %}</p>{% end %}\
             {% var $$slots$2 = {}; $$slots$2[\"main\"] = $$slot$1; %}\
             {% card(1; $slots=$$slots$2) %}{% end %}"
        );
    }

    #[test]
    fn should_number_temporaries_per_compile() {
        let out = body("+a\n  @slot #x\n+b\n  @slot #y\n  @slot #z");
        assert_in_order(
            &out,
            &[
                "{% const $$slot$1 = func(default_slot) %}",
                "{% var $$slots$2 = {}; $$slots$2[\"x\"] = $$slot$1; %}",
                "{% const $$slot$3 = func(default_slot) %}",
                "{% const $$slot$4 = func(default_slot) %}",
                "{% var $$slots$5 = {}; $$slots$5[\"y\"] = $$slot$3; $$slots$5[\"z\"] = $$slot$4; %}",
            ],
        );
    }

    #[test]
    fn should_key_slot_maps_by_expression() {
        let out = body("+card\n  @slot #(name)\n  @slot #\"my-slot\"");
        assert_in_order(
            &out,
            &["$$slots$3[name] = $$slot$1;", "$$slots$3[\"my-slot\"] = $$slot$2;"],
        );
    }

    #[test]
    fn should_run_init_code_before_call() {
        assert_eq!(
            body("+card() ~\n  ~ var n = 2\n  p #{n}"),
            "{% do %}\
             {% const $$slot$1 = func(*args; **kwargs) %}<p>{% giom$write(n) %}</p>{% end %}\
             {% var $$slots$2 = {}; $$slots$2[\"main\"] = $$slot$1; %}\
             {% var n = 2; %}\
             {% card(;$slots=$$slots$2) %}{% end %}"
        );
    }

    #[test]
    fn should_run_init_code_without_slots() {
        assert_eq!(
            body("+card(n) ~\n  ~ var n = 2"),
            "{% do %}{% var n = 2; %}{% card(n) %}{% end %}"
        );
    }

    #[test]
    fn should_let_override_call_default_slot() {
        let out = body(
            "@comp card\n  @slot main\n    p default\n\
             +card\n  @slot #main\n    p before\n    ~ default_slot()\n    p after",
        );
        assert_in_order(
            &out,
            &[
                "{% const $slot$main$ = func(default_slot) %}<p>{% giom$write(\"default\") %}</p>{% end %}",
                "{% var $slot$main = $slots[\"main\"] ?? $slot$main$ %}",
                "{% $slot$main($slot$main$) %}",
                "{% const $$slot$1 = func(default_slot) %}",
                "<p>{% giom$write(\"before\") %}</p>{% default_slot(); %}<p>{% giom$write(\"after\") %}</p>",
                "{% card(;$slots=$$slots$2) %}",
            ],
        );
    }
}
