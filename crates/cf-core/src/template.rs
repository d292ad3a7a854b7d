use crate::nsti::Nsti;

/// Values available to path templates: the model name plus the NSTI fields.
#[derive(Clone, Copy, Debug)]
pub struct TemplateContext<'a> {
    pub model_name: &'a str,
    pub nsti: Nsti,
}

/// Substitute the named placeholders of `template`:
/// `{modelName}`, `{n_s_t_i}`, `{n}`, `{s}`, `{t}`, `{i}`.
///
/// Unrecognized placeholders are left verbatim so a partially applicable
/// template can be shared across tool kinds. The cost is that a typo in a
/// placeholder name survives silently into the resolved path.
pub fn resolve_template(template: &str, ctx: &TemplateContext) -> String {
    // Longest keys first so `{n}` never clobbers `{n_s_t_i}`.
    let pairs: [(&str, String); 6] = [
        ("{modelName}", ctx.model_name.to_string()),
        ("{n_s_t_i}", ctx.nsti.joined()),
        ("{n}", ctx.nsti.n.to_string()),
        ("{s}", ctx.nsti.s.to_string()),
        ("{t}", ctx.nsti.t.to_string()),
        ("{i}", ctx.nsti.i.to_string()),
    ];
    let mut resolved = template.to_string();
    for (key, value) in &pairs {
        resolved = resolved.replace(key, value);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> TemplateContext<'static> {
        TemplateContext {
            model_name: "MQXA",
            nsti: Nsti::new(55, 1, 2, 3),
        }
    }

    #[test]
    fn resolves_all_placeholders() {
        let out = resolve_template("{modelName}_{n_s_t_i}/{n}/{s}/{t}/{i}", &ctx());
        assert_eq!(out, "MQXA_55_1_2_3/55/1/2/3");
    }

    #[test]
    fn unknown_placeholder_left_verbatim() {
        let out = resolve_template("{modelName}_{typo}.csv", &ctx());
        assert_eq!(out, "MQXA_{typo}.csv");
    }

    #[test]
    fn joined_not_clobbered_by_single_fields() {
        let out = resolve_template("{n_s_t_i}_{n}", &ctx());
        assert_eq!(out, "55_1_2_3_55");
    }

    proptest! {
        // Resolution is a pure function of (template, context).
        #[test]
        fn resolution_is_deterministic(template in "[a-zA-Z0-9_{}./]{0,40}") {
            let a = resolve_template(&template, &ctx());
            let b = resolve_template(&template, &ctx());
            prop_assert_eq!(a, b);
        }
    }
}
