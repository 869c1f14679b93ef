//! Tree-sitter query strings used to find out what a Java program is called.

/// Tree-sitter query that returns the top-level classes
/// * `name`: name of the class
pub const CLASSNAME_QUERY: &str = include_str!("class_name.scm");

/// Tree-sitter query that returns the top-level `public` classes
/// * `name`: name of the class
pub const PUBLIC_CLASS_QUERY: &str = include_str!("public_class.scm");

/// Tree-sitter query that returns top-level classes declaring `main`
/// * `class`: name of the class
/// * `method`: always `main`
pub const MAIN_METHOD_QUERY: &str = include_str!("main_method.scm");

/// Tree-sitter query that returns name of the package
/// * `name`: name of the package
pub const PACKAGE_QUERY: &str = include_str!("package.scm");
