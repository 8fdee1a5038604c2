//! Fluent builder for indented source text.

/// Indentation of one nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(u8),
    Tab,
}

impl Indent {
    /// 2 spaces: TypeScript, YAML, Prisma and proto files.
    pub const TWO: Self = Self::Spaces(2);

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spaces(2) => "  ",
            Self::Spaces(4) => "    ",
            // anything else renders as 2
            Self::Spaces(_) => "  ",
            Self::Tab => "\t",
        }
    }
}

impl Default for Indent {
    fn default() -> Self {
        Self::TWO
    }
}

/// Accumulates lines at the current indentation.
///
/// ```
/// use keel_codegen::CodeBuilder;
///
/// let code = CodeBuilder::typescript()
///     .import(&["Injectable"], "@nestjs/common")
///     .blank()
///     .line("@Injectable()")
///     .braces("export class TaskService", |b| b)
///     .build();
///
/// assert_eq!(
///     code,
///     "import { Injectable } from \"@nestjs/common\";\n\n@Injectable()\nexport class TaskService {\n}\n"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct CodeBuilder {
    level: usize,
    indent: Indent,
    buffer: String,
}

impl CodeBuilder {
    pub fn new(indent: Indent) -> Self {
        Self {
            level: 0,
            indent,
            buffer: String::new(),
        }
    }

    pub fn typescript() -> Self {
        Self::new(Indent::TWO)
    }

    pub fn yaml() -> Self {
        Self::new(Indent::TWO)
    }

    pub fn prisma() -> Self {
        Self::new(Indent::TWO)
    }

    pub fn proto() -> Self {
        Self::new(Indent::TWO)
    }

    /// Add a line at the current indentation.
    pub fn line(mut self, s: &str) -> Self {
        self.push_line(s);
        self
    }

    /// Add several lines at the current indentation.
    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.push_line(line.as_ref());
        }
        self
    }

    /// Add an empty line.
    pub fn blank(mut self) -> Self {
        self.buffer.push('\n');
        self
    }

    pub fn indent(mut self) -> Self {
        self.level += 1;
        self
    }

    pub fn dedent(mut self) -> Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// A header line followed by an indented body, no closing line
    /// (YAML mappings).
    pub fn block<F>(self, header: &str, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        f(self.line(header).indent()).dedent()
    }

    /// A header, an indented body and a closing line.
    pub fn block_with_close<F>(self, header: &str, close: &str, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        f(self.line(header).indent()).dedent().line(close)
    }

    /// `header {` ... `}`.
    pub fn braces<F>(self, header: &str, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.block_with_close(&format!("{header} {{"), "}", f)
    }

    /// A TypeScript named import.
    pub fn import(self, names: &[&str], from: &str) -> Self {
        let line = format!("import {{ {} }} from \"{from}\";", names.join(", "));
        self.line(&line)
    }

    /// A TypeScript namespace import (`import * as common from "..."`).
    pub fn import_all(self, alias: &str, from: &str) -> Self {
        self.line(&format!("import * as {alias} from \"{from}\";"))
    }

    /// A single-line TSDoc comment.
    pub fn jsdoc(self, text: &str) -> Self {
        self.line(&format!("/** {text} */"))
    }

    /// A line comment with the given prefix (`//`, `#`).
    pub fn comment(self, prefix: &str, text: &str) -> Self {
        self.line(&format!("{prefix} {text}"))
    }

    pub fn when<F>(self, condition: bool, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        if condition { f(self) } else { self }
    }

    pub fn each<T, I, F>(mut self, items: I, f: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(Self, T) -> Self,
    {
        for item in items {
            self = f(self, item);
        }
        self
    }

    /// Like [`each`](Self::each), with a blank line between items.
    pub fn each_separated<T, I, F>(mut self, items: I, f: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(Self, T) -> Self,
    {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self = self.blank();
            }
            self = f(self, item);
        }
        self
    }

    pub fn build(self) -> String {
        self.buffer
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    fn push_line(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.level {
                self.buffer.push_str(self.indent.as_str());
            }
            self.buffer.push_str(s);
        }
        self.buffer.push('\n');
    }
}
