// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Nested nominal form: `dict[str, list[int]]`.

use std::fmt::Write as _;

use crate::ept::{split_args, Ept};
use crate::error::TypeError;
use crate::registry::TypeRegistry;
use crate::uid::TypeUid;

impl TypeRegistry {
    /// Parses a nominal type such as `dict[str, list[int]]`.
    ///
    /// Names are looked up in the registry; the number of bracketed arguments
    /// must match each head's template-type count.
    ///
    /// # Errors
    /// [`TypeError::Nominal`] for syntax errors,
    /// [`TypeError::UnknownTypeName`] or [`TypeError::MalformedEpt`].
    pub fn parse(&self, nominal: &str) -> Result<Ept, TypeError> {
        let mut parser = Parser {
            src: nominal,
            pos: 0,
            registry: self,
        };
        let mut flat = Vec::new();
        parser.ept(&mut flat)?;
        parser.skip_ws();
        if parser.pos != nominal.len() {
            return Err(parser.error("end of input"));
        }
        Ept::from_flat(&flat)
    }

    /// Renders an EPT in nominal form. Unregistered UIDs print as hex.
    pub fn display(&self, ept: &Ept) -> String {
        let mut out = String::new();
        self.render(ept.flat(), &mut out);
        out
    }

    fn render(&self, flat: &[TypeUid], out: &mut String) {
        let head = flat[0];
        match self.resolve(head) {
            Ok(def) => out.push_str(&def.name),
            Err(_) => {
                let _ = write!(out, "{head}");
            }
        }
        if flat.len() > 1 {
            out.push('[');
            for (i, arg) in split_args(flat).into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                self.render(arg, out);
            }
            out.push(']');
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    registry: &'a TypeRegistry,
}

impl<'a> Parser<'a> {
    fn error(&self, expected: &str) -> TypeError {
        TypeError::Nominal {
            position: self.pos,
            message: format!("expected {expected}"),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), TypeError> {
        self.skip_ws();
        if self.peek() == Some(want) {
            self.pos += want.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("'{want}'")))
        }
    }

    fn name(&mut self) -> Result<&'a str, TypeError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self
            .peek()
            .filter(|c| !c.is_whitespace() && !matches!(c, '[' | ']' | ','))
        {
            self.pos += c.len_utf8();
        }
        if start == self.pos {
            return Err(self.error("a type name"));
        }
        Ok(&self.src[start..self.pos])
    }

    fn ept(&mut self, flat: &mut Vec<TypeUid>) -> Result<(), TypeError> {
        let name = self.name()?;
        let head = self.registry.uid_of(name)?;
        flat.push(head);
        let arity = head.template_type_count();
        if arity == 0 {
            return Ok(());
        }
        self.expect('[')?;
        for i in 0..arity {
            if i > 0 {
                self.expect(',')?;
            }
            self.ept(flat)?;
        }
        self.expect(']')
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::error::TypeError;
    use crate::registry::TypeRegistry;

    const TYPES: &str = r#"[
        {"name": "object", "uid": 1, "kind": "abstract"},
        {"name": "int", "uid": 3, "kind": "concrete", "parents": ["object"]},
        {"name": "str", "uid": 5, "kind": "concrete", "parents": ["object"]},
        {"name": "list", "uid": 268435462, "kind": "concrete", "parents": ["object"]},
        {"name": "dict", "uid": 536870920, "kind": "concrete", "parents": ["object"]}
    ]"#;

    #[test]
    fn parses_and_displays_nested_types() {
        let reg = TypeRegistry::from_json(TYPES).unwrap();
        let ept = reg.parse("dict[ str,list[int] ]").unwrap();
        assert_eq!(ept.len(), 4);
        assert_eq!(reg.display(&ept), "dict[str, list[int]]");
        assert_eq!(reg.parse(&reg.display(&ept)).unwrap(), ept);
    }

    #[test]
    fn arity_and_syntax_errors_are_reported() {
        let reg = TypeRegistry::from_json(TYPES).unwrap();
        assert!(matches!(reg.parse("list"), Err(TypeError::Nominal { position: 4, .. })));
        assert!(matches!(reg.parse("dict[int]"), Err(TypeError::Nominal { .. })));
        assert!(matches!(reg.parse("int]"), Err(TypeError::Nominal { .. })));
        assert!(matches!(
            reg.parse("list[float]"),
            Err(TypeError::UnknownTypeName(name)) if name == "float"
        ));
    }
}
