use std::collections::BTreeMap;

use anyhow::bail;

pub const DEFAULT_PROFILE_TEMPLATE: &str = "
    [profile {profile_name}]
    sso_session = {sso_session}
    sso_account_id = {account_id}
    sso_role_name = {role_name}
";

pub const SSO_SESSION_TEMPLATE: &str = "
    [sso-session {sso_session_name}]
    sso_start_url = {sso_start_url}
    sso_region = {sso_region}
";

pub type Variables = BTreeMap<String, String>;

/// Removes the leading whitespace every non-blank line has in common.
///
/// Whitespace-only lines are emptied and don't take part in the margin.
pub fn dedent(text: &str) -> String {
    fn indent(line: &str) -> &str {
        let content = line.trim_start_matches([' ', '\t']);
        &line[..line.len() - content.len()]
    }

    fn is_blank(line: &str) -> bool {
        line.trim().is_empty()
    }

    let margin = text
        .split('\n')
        .filter(|line| !is_blank(line))
        .map(indent)
        .reduce(|margin, line_indent| {
            let common = margin
                .chars()
                .zip(line_indent.chars())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a.len_utf8())
                .sum();
            &margin[..common]
        })
        .unwrap_or("");

    text.split('\n')
        .map(|line| {
            if is_blank(line) {
                ""
            } else {
                &line[margin.len()..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills `{name}` placeholders from `variables`. `{{` and `}}` are literal braces.
pub fn render(template: &str, variables: &Variables) -> anyhow::Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if chars.next_if(|&(_, next)| next == '{').is_some() => rendered.push('{'),
            '}' if chars.next_if(|&(_, next)| next == '}').is_some() => rendered.push('}'),
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }

                if !closed {
                    bail!("unclosed placeholder at offset {} in template", pos);
                }

                if name.is_empty() {
                    bail!("empty placeholder at offset {} in template", pos);
                }

                match variables.get(&name) {
                    Some(value) => rendered.push_str(value),
                    None => bail!(
                        "template references undefined placeholder `{}`. available:{}",
                        name,
                        variables.keys().cloned().collect::<Vec<_>>().join(",")
                    ),
                }
            }
            '}' => bail!("single `}}` at offset {} in template", pos),
            c => rendered.push(c),
        }
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn dedent_removes_common_margin() {
        let text = "\n    [profile a]\n      nested = 1\n  \n    key = v\n";
        assert_eq!(dedent(text), "\n[profile a]\n  nested = 1\n\nkey = v\n");
    }

    #[test]
    fn dedent_keeps_unindented_text() {
        assert_eq!(dedent("a\n  b\n"), "a\n  b\n");
        assert_eq!(dedent(""), "");
    }

    #[test]
    fn dedent_does_not_mix_tabs_and_spaces() {
        assert_eq!(dedent("\tfoo\n  bar\n"), "\tfoo\n  bar\n");
    }

    #[test]
    fn render_fills_placeholders() {
        let rendered = render(
            "[profile {profile_name}]\nregion = {region}\n",
            &vars(&[("profile_name", "dev-Admin"), ("region", "us-west-2")]),
        )
        .unwrap();
        assert_eq!(rendered, "[profile dev-Admin]\nregion = us-west-2\n");
    }

    #[test]
    fn render_unescapes_double_braces() {
        let rendered = render("{{literal}} {name}}}", &vars(&[("name", "x")])).unwrap();
        assert_eq!(rendered, "{literal} x}");
    }

    #[test]
    fn render_fails_on_undefined_placeholder() {
        let err = render("region = {region}", &vars(&[("profile_name", "p")])).unwrap_err();
        assert!(err.to_string().contains("`region`"), "{}", err);
    }

    #[test]
    fn render_does_not_trim_placeholder_names() {
        let err = render("region = { region }", &vars(&[("region", "us-west-2")])).unwrap_err();
        assert!(err.to_string().contains("` region `"), "{}", err);
    }

    #[test]
    fn render_fails_on_unbalanced_braces() {
        assert!(render("{open", &Variables::new()).is_err());
        assert!(render("close}", &Variables::new()).is_err());
        assert!(render("{}", &Variables::new()).is_err());
    }

    #[test]
    fn default_profile_template_renders_flush_left() {
        let rendered = render(
            &dedent(DEFAULT_PROFILE_TEMPLATE),
            &vars(&[
                ("profile_name", "dev-Admin"),
                ("sso_session", "acme"),
                ("account_id", "111111111111"),
                ("role_name", "Admin"),
            ]),
        )
        .unwrap();
        assert_eq!(
            rendered,
            "\n[profile dev-Admin]\nsso_session = acme\nsso_account_id = 111111111111\nsso_role_name = Admin\n"
        );
    }
}
