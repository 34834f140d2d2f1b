//! Minimal GLSL front end for the headless backend.
//!
//! Checks the shape of a stage (leading `#version`, balanced delimiters,
//! statement terminators, a `main` entry point) and reflects the global
//! `in`/`out`/`uniform` declarations. It does not type-check function bodies.
//! Diagnostics follow the `0:LINE(COL): error: ...` layout drivers print.

use std::collections::HashSet;

use crate::engine::graphics::backend::ShaderStage;
use crate::engine::graphics::uniform::{UniformKind, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslType {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Sampler2D,
}

impl GlslType {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "float" => GlslType::Float,
            "int" => GlslType::Int,
            "vec2" => GlslType::Vec2,
            "vec3" => GlslType::Vec3,
            "vec4" => GlslType::Vec4,
            "mat4" => GlslType::Mat4,
            "sampler2D" => GlslType::Sampler2D,
            _ => return None,
        })
    }

    /// The uniform setter kind this type accepts. Samplers take a texture unit.
    pub fn uniform_kind(self) -> Option<UniformKind> {
        match self {
            GlslType::Float => Some(UniformKind::Float),
            GlslType::Int | GlslType::Sampler2D => Some(UniformKind::Int),
            GlslType::Vec3 => Some(UniformKind::Vec3),
            GlslType::Vec4 => Some(UniformKind::Vec4),
            GlslType::Mat4 => Some(UniformKind::Mat4),
            GlslType::Vec2 => None,
        }
    }

    /// Value a uniform of this type holds before anything is written to it.
    pub fn zero_value(self) -> Option<UniformValue> {
        let kind = self.uniform_kind()?;
        kind.from_f32s(&[0.0; 16])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: GlslType,
    pub location: Option<u32>,
}

/// Global interface of one compiled stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageInterface {
    pub inputs: Vec<Variable>,
    pub outputs: Vec<Variable>,
    pub uniforms: Vec<Variable>,
}

/// Interface of a linked program: vertex attributes and active uniforms, in
/// location order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramInterface {
    pub attributes: Vec<Variable>,
    pub uniforms: Vec<Variable>,
}

fn error_at(line: usize, message: impl AsRef<str>) -> String {
    format!("0:{}(1): error: {}", line, message.as_ref())
}

/// Replaces comments with spaces, keeping line breaks so line numbers hold.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Parses `layout (location = N)` and returns the location plus the rest of
/// the declaration.
fn split_layout(decl: &str, line: usize) -> Result<(Option<u32>, &str), String> {
    let Some(rest) = decl.strip_prefix("layout") else {
        return Ok((None, decl));
    };
    let Some(rest) = rest.trim_start().strip_prefix('(') else {
        return Err(error_at(line, "syntax error, malformed layout qualifier"));
    };
    let Some(close) = rest.find(')') else {
        return Err(error_at(line, "syntax error, malformed layout qualifier"));
    };
    let inner = &rest[..close];
    let mut location = None;
    for qualifier in inner.split(',') {
        let mut parts = qualifier.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let value = parts.next().map(str::trim);
        if key == "location" {
            let parsed = value
                .and_then(|v| v.parse::<u32>().ok())
                .ok_or_else(|| error_at(line, "layout location must be an integer constant"))?;
            location = Some(parsed);
        }
    }
    Ok((location, rest[close + 1..].trim_start()))
}

/// Reflects a global `in`/`out`/`uniform` declaration. Other global
/// statements are accepted as-is.
fn parse_global(
    decl: &str,
    line: usize,
    interface: &mut StageInterface,
    names: &mut HashSet<String>,
) -> Result<(), String> {
    let (location, rest) = split_layout(decl, line)?;
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let Some(&qualifier) = tokens.first() else {
        return Ok(());
    };
    if !matches!(qualifier, "in" | "out" | "uniform") {
        return Ok(());
    }
    let (Some(&ty), Some(&name)) = (tokens.get(1), tokens.get(2)) else {
        return Err(error_at(line, format!("syntax error, incomplete `{qualifier}` declaration")));
    };
    if tokens.len() > 3 {
        return Err(error_at(line, format!("syntax error, unexpected `{}`", tokens[3])));
    }
    let ty = GlslType::parse(ty)
        .ok_or_else(|| error_at(line, format!("syntax error, unknown type `{ty}`")))?;
    if !names.insert(name.to_string()) {
        return Err(error_at(line, format!("`{name}` redeclared")));
    }
    let variable = Variable { name: name.to_string(), ty, location };
    match qualifier {
        "in" => interface.inputs.push(variable),
        "out" => interface.outputs.push(variable),
        _ => interface.uniforms.push(variable),
    }
    Ok(())
}

/// Compiles one stage. On failure the `Err` carries the info log.
pub fn compile(stage: ShaderStage, source: &str) -> Result<StageInterface, String> {
    if source.trim().is_empty() {
        return Err(error_at(0, format!("{stage} shader source is empty")));
    }
    let stripped = strip_comments(source);
    let lines: Vec<(usize, &str)> = stripped
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    match lines.first() {
        Some((_, first)) if first.starts_with("#version") => {
            let number = first["#version".len()..].split_whitespace().next();
            if number.and_then(|n| n.parse::<u32>().ok()).is_none() {
                return Err(error_at(lines[0].0, "#version requires a version number"));
            }
        }
        Some((n, _)) => return Err(error_at(*n, "#version directive must come first")),
        None => return Err(error_at(0, format!("{stage} shader source is empty"))),
    }

    let mut interface = StageInterface::default();
    let mut names = HashSet::new();
    let mut braces = 0i32;
    let mut parens = 0i32;
    let mut has_main = false;

    for (idx, &(n, text)) in lines.iter().enumerate().skip(1) {
        if text.starts_with("#version") {
            return Err(error_at(n, "#version must occur only once, before anything else"));
        }
        if text.starts_with('#') {
            continue;
        }
        let at_global = braces == 0;
        for c in text.chars() {
            match c {
                '{' => braces += 1,
                '}' => braces -= 1,
                '(' => parens += 1,
                ')' => parens -= 1,
                _ => {}
            }
            if braces < 0 {
                return Err(error_at(n, "syntax error, unexpected `}`"));
            }
            if parens < 0 {
                return Err(error_at(n, "syntax error, unexpected `)`"));
            }
        }

        let last = text.chars().last().unwrap_or(';');
        let opens_block = lines.get(idx + 1).is_some_and(|(_, next)| next.starts_with('{'));
        let terminated =
            matches!(last, ';' | '{' | '}' | ',' | '(') || (last == ')' && opens_block);
        if !terminated {
            return Err(error_at(n, "syntax error, unexpected end of line, expecting `;`"));
        }

        if at_global {
            if text.starts_with("void main") && text.contains('(') {
                has_main = true;
            } else if last == ';' {
                parse_global(text.trim_end_matches(';').trim(), n, &mut interface, &mut names)?;
            }
        }
    }

    let end = lines.last().map_or(0, |(n, _)| *n);
    if braces != 0 {
        return Err(error_at(end, "syntax error, unexpected end of file, unbalanced `{`"));
    }
    if parens != 0 {
        return Err(error_at(end, "syntax error, unexpected end of file, unbalanced `(`"));
    }
    if !has_main {
        return Err(error_at(end, "no definition of `void main()`"));
    }
    Ok(interface)
}

/// Links a vertex and fragment interface. On failure the `Err` carries the
/// info log with one line per problem.
pub fn link(
    vertex: &StageInterface,
    fragment: &StageInterface,
) -> Result<ProgramInterface, String> {
    let mut errors = Vec::new();

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|o| o.name == input.name) {
            None => errors.push(format!(
                "error: fragment shader input `{}` is not written by the vertex shader",
                input.name
            )),
            Some(output) if output.ty != input.ty => errors.push(format!(
                "error: `{}` is {:?} in the vertex shader but {:?} in the fragment shader",
                input.name, output.ty, input.ty
            )),
            Some(_) => {}
        }
    }

    let mut uniforms: Vec<Variable> = Vec::new();
    for uniform in vertex.uniforms.iter().chain(&fragment.uniforms) {
        match uniforms.iter().find(|u| u.name == uniform.name) {
            Some(existing) if existing.ty != uniform.ty => errors.push(format!(
                "error: uniform `{}` declared with different types across stages",
                uniform.name
            )),
            Some(_) => {}
            None => uniforms.push(Variable {
                name: uniform.name.clone(),
                ty: uniform.ty,
                location: Some(uniforms.len() as u32),
            }),
        }
    }

    if !errors.is_empty() {
        return Err(errors.join("\n"));
    }

    let mut attributes = vertex.inputs.clone();
    let mut next = 0;
    for attribute in attributes.iter_mut() {
        if attribute.location.is_none() {
            while vertex.inputs.iter().any(|a| a.location == Some(next)) {
                next += 1;
            }
            attribute.location = Some(next);
            next += 1;
        }
    }
    Ok(ProgramInterface { attributes, uniforms })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 330 core\n\
        layout (location = 0) in vec3 aPos;\n\
        layout (location = 1) in vec2 aTexCoord;\n\
        out vec2 TexCoord;\n\
        uniform mat4 transform; // model transform\n\
        void main()\n\
        {\n\
            gl_Position = transform * vec4(aPos, 1.0);\n\
            TexCoord = aTexCoord;\n\
        }\n";

    const FRAGMENT: &str = "#version 330 core\n\
        out vec4 FragColor;\n\
        in vec2 TexCoord;\n\
        uniform sampler2D texture1;\n\
        void main() {\n\
            FragColor = texture(texture1, TexCoord);\n\
        }\n";

    #[test]
    fn test_reflects_globals() {
        let iface = compile(ShaderStage::Vertex, VERTEX).unwrap();
        assert_eq!(iface.inputs.len(), 2);
        assert_eq!(iface.inputs[1].location, Some(1));
        assert_eq!(iface.outputs[0].name, "TexCoord");
        assert_eq!(iface.uniforms[0].ty, GlslType::Mat4);
    }

    #[test]
    fn test_missing_semicolon_reports_line() {
        let broken = VERTEX.replace("TexCoord = aTexCoord;", "TexCoord = aTexCoord");
        let log = compile(ShaderStage::Vertex, &broken).unwrap_err();
        assert!(log.starts_with("0:9(1): error:"), "{log}");
    }

    #[test]
    fn test_version_must_come_first() {
        let log = compile(ShaderStage::Fragment, "void main() {}\n").unwrap_err();
        assert!(log.contains("#version"));
    }

    #[test]
    fn test_block_comments_keep_line_numbers() {
        let src = "#version 330 core\n/* a\n b */\nvoid main()\n{\n  x = 1\n}\n";
        let log = compile(ShaderStage::Fragment, src).unwrap_err();
        assert!(log.starts_with("0:6(1)"), "{log}");
    }

    #[test]
    fn test_unknown_type_and_redeclaration() {
        let src = "#version 330 core\nuniform vec9 x;\nvoid main() {}\n";
        assert!(compile(ShaderStage::Fragment, src).unwrap_err().contains("vec9"));
        let src = "#version 330 core\nuniform float x;\nin float x;\nvoid main() {}\n";
        assert!(compile(ShaderStage::Fragment, src).unwrap_err().contains("redeclared"));
    }

    #[test]
    fn test_unbalanced_braces_and_missing_main() {
        let src = "#version 330 core\nvoid main() {\n";
        assert!(compile(ShaderStage::Vertex, src).unwrap_err().contains("unbalanced"));
        let src = "#version 330 core\nuniform float x;\n";
        assert!(compile(ShaderStage::Vertex, src).unwrap_err().contains("main"));
    }

    #[test]
    fn test_link_merges_uniforms_and_checks_varyings() {
        let v = compile(ShaderStage::Vertex, VERTEX).unwrap();
        let f = compile(ShaderStage::Fragment, FRAGMENT).unwrap();
        let program = link(&v, &f).unwrap();
        let names: Vec<_> = program.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["transform", "texture1"]);
        assert_eq!(program.uniforms[1].location, Some(1));

        let lonely = FRAGMENT.replace("in vec2 TexCoord;", "in vec2 Missing;");
        let f = compile(ShaderStage::Fragment, &lonely).unwrap();
        assert!(link(&v, &f).unwrap_err().contains("Missing"));
    }

    #[test]
    fn test_attributes_without_layout_fill_free_slots() {
        let src = "#version 330 core\n\
            layout (location = 0) in vec3 a;\n\
            in vec3 b;\n\
            void main() {}\n";
        let v = compile(ShaderStage::Vertex, src).unwrap();
        let program = link(&v, &StageInterface::default()).unwrap();
        assert_eq!(program.attributes[1].location, Some(1));
    }

    #[test]
    fn test_close_paren_before_open_is_malformed_layout() {
        let src = "#version 330 core\n\
            float f(\n\
            layout ) (location = 0) in vec3 a;\n\
            void main() {}\n";
        let log = compile(ShaderStage::Vertex, src).unwrap_err();
        assert!(log.starts_with("0:3(1)"), "{log}");
        assert!(log.contains("malformed layout qualifier"));

        let unclosed = "#version 330 core\nlayout (location = 0 in vec3 a;\nvoid main() {}\n";
        assert!(compile(ShaderStage::Vertex, unclosed).is_err());
    }
}
