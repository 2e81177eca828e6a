//! The observer interface every lowered property refers to.

use crate::lower::LowerOptions;

/// Returns the path of the unit declaring the observer interface, such as
/// `grande/PropertyObserver.java`.
pub fn unit_name(options: &LowerOptions) -> String {
    let mut name = options.observer_package.replace('.', "/");

    if !name.is_empty() {
        name.push('/');
    }

    name.push_str(&options.observer_name);
    name.push_str(".java");

    name
}

/// Returns the source text of the unit declaring the observer interface.
pub fn unit_source(options: &LowerOptions) -> String {
    let mut text = String::new();

    if !options.observer_package.is_empty() {
        text.push_str(&format!("package {};\n\n", options.observer_package));
    }

    text.push_str(&format!(
        "public interface {}<T> {{\n{}void changed(T oldValue, T newValue);\n}}\n",
        options.observer_name,
        " ".repeat(options.indent as usize),
    ));

    text
}
