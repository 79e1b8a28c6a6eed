//! Extraction of vertex inputs and uniforms from GLSL source text.

use crate::error::{GraphicsError, GraphicsResult};
use crate::layout::{
    GlslType, UniformAttribute, UniformAttributes, VertexAttribute, VertexAttributes,
};
use once_cell::sync::Lazy;
use regex::Regex;

static VERTEX_INPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\blayout\s*\(\s*location\s*=\s*(\d+)\s*\)\s*in\s+(\w+)\s+(\w+)\s*;")
        .expect("vertex input pattern is valid")
});

static UNIFORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\buniform\s+(\w+)\s+(\w+)\s*;")
        .expect("uniform pattern is valid")
});

/// Source lines with `//` comments removed.
fn code_lines(source: &str) -> impl Iterator<Item = &str> {
    source
        .lines()
        .map(|line| line.split_once("//").map_or(line, |(code, _)| code))
}

fn parse_type(kind: &'static str, name: &str) -> GraphicsResult<GlslType> {
    GlslType::from_glsl_name(name).ok_or_else(|| GraphicsError::UnknownDataType {
        kind,
        name: name.to_string(),
    })
}

/// Parse the `layout(location = N) in TYPE NAME;` inputs of a vertex shader.
///
/// Declarations may appear in any order; the resulting layout is ordered by location and
/// must cover `0..n` without gaps.
pub fn parse_vertex_attributes(source: &str) -> GraphicsResult<VertexAttributes> {
    let mut attributes = Vec::new();
    for line in code_lines(source) {
        for captures in VERTEX_INPUT.captures_iter(line) {
            let location = captures[1].parse::<u32>().map_err(|_| {
                GraphicsError::InvalidVertexLayout(format!("invalid location {}", &captures[1]))
            })?;
            let data_type = parse_type("vertex", &captures[2])?;
            attributes.push(VertexAttribute::new(data_type, &captures[3], location));
        }
    }
    attributes.sort_by_key(|a| a.location);
    VertexAttributes::new(attributes)
}

/// Parse the `uniform TYPE NAME;` declarations across all stages of a program.
///
/// A uniform declared with the same type in several stages is listed once; declaring it with
/// different types is an error.
pub fn parse_uniform_attributes(sources: &[&str]) -> GraphicsResult<UniformAttributes> {
    let mut uniforms: Vec<UniformAttribute> = Vec::new();
    for source in sources {
        for line in code_lines(source) {
            for captures in UNIFORM.captures_iter(line) {
                let data_type = parse_type("uniform", &captures[1])?;
                let name = &captures[2];
                match uniforms.iter().find(|u| u.name == name) {
                    Some(existing) if existing.data_type == data_type => {}
                    Some(_) => return Err(GraphicsError::DuplicateUniform(name.to_string())),
                    None => uniforms.push(UniformAttribute::new(data_type, name)),
                }
            }
        }
    }
    UniformAttributes::new(uniforms)
}
