//! Identifier case conversion used by the `toCamelCase`, `toPascalCase`,
//! `toSnakeCase` and `toKebabCase` marker functions.
//!
//! | Input            | snake              | camel            | pascal           |
//! |------------------|--------------------|------------------|------------------|
//! | `"my-app"`       | `my_app`           | `myApp`          | `MyApp`          |
//! | `"HTTPRequest"`  | `http_request`     | `httpRequest`    | `HttpRequest`    |
//! | `"my awesome"`   | `my_awesome`       | `myAwesome`      | `MyAwesome`      |

/// Convert a string to snake_case.
pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// Convert a string to kebab-case.
pub fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

/// Convert a string to PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// Convert a string to camelCase.
///
/// The first word stays lowercase, every following word is capitalized.
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::new();
    for (i, word) in split_words(s).iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(word.len());
            // to_uppercase handles multi-char mappings ("ß" -> "SS")
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Split a string into lowercase words.
///
/// ## Word Boundary Detection
///
/// 1. **Explicit separators:** `_`, `-`, `.`, whitespace → always split
/// 2. **Case transition (camelCase):** `aB` → split between `a` and `B`
/// 3. **Acronym boundary:** `HTTPRequest` → split between `P` and `R`
///    (detected by `Upper Upper Lower` pattern)
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(&next) = chars.peek() {
            // "myApp" → "my" + "App", "v2Api" → "v2" + "Api"
            if (c.is_lowercase() || c.is_ascii_digit()) && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            // "HTTPServer" → "HTTP" + "Server"
            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(|n| n.is_lowercase())
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_from_mixed_inputs() {
        assert_eq!(to_snake_case("MyApp"), "my_app");
        assert_eq!(to_snake_case("my-app"), "my_app");
        assert_eq!(to_snake_case("HTTPRequest"), "http_request");
        assert_eq!(to_snake_case("XMLHttpRequest"), "xml_http_request");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn camel_case_keeps_first_word_lower() {
        assert_eq!(to_camel_case("foo_bar"), "fooBar");
        assert_eq!(to_camel_case("Foo Bar baz"), "fooBarBaz");
        assert_eq!(to_camel_case("demo"), "demo");
    }

    #[test]
    fn pascal_case_capitalizes_every_word() {
        assert_eq!(to_pascal_case("my-awesome-app"), "MyAwesomeApp");
        assert_eq!(to_pascal_case("HTTPRequest"), "HttpRequest");
        assert_eq!(to_pascal_case("v2Api"), "V2Api");
    }

    #[test]
    fn kebab_case_joins_with_dash() {
        assert_eq!(to_kebab_case("My Awesome App"), "my-awesome-app");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert_eq!(to_snake_case(""), "");
        assert_eq!(to_camel_case("__"), "");
        assert_eq!(to_pascal_case(" "), "");
    }
}
