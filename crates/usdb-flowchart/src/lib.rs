//! USDB Flowchart Generator
//!
//! Lowers a program into one flowchart for the main body and one per
//! routine, and computes a layered layout for drawing them. C sources are
//! first translated to Algo; node spans are then mapped back to C lines.

mod layout;
mod lower;
mod model;

pub use layout::*;
pub use lower::*;
pub use model::*;

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use usdb_ast::{Location, Span};

/// Source language of a flowchart request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Algo,
    C,
}

impl FromStr for Language {
    type Err = FlowchartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "algo" => Ok(Language::Algo),
            "c" => Ok(Language::C),
            other => Err(FlowchartError::UnknownLanguage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowchartError {
    #[error("unknown language '{0}', expected 'algo' or 'c'")]
    UnknownLanguage(String),

    #[error("Line {line}, Column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("C translation failed: {0}")]
    Translation(String),
}

/// Everything the diagram host needs for one source file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowchartOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<FlowchartSet>,
    pub subroutines: BTreeMap<String, FlowchartSet>,
    /// Translator source map, present for C input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlowchartOutput {
    fn failure(error: FlowchartError) -> Self {
        Self {
            success: false,
            main: None,
            subroutines: BTreeMap::new(),
            source_map: None,
            error: Some(error.to_string()),
        }
    }
}

/// Build every flowchart of `source`; failures are reported in the output
pub fn generate_all_flowcharts(source: &str, language: Language) -> FlowchartOutput {
    match try_generate(source, language) {
        Ok((charts, source_map)) => FlowchartOutput {
            success: true,
            main: Some(charts.main),
            subroutines: charts.subroutines,
            source_map,
            error: None,
        },
        Err(err) => {
            log::debug!("flowchart generation failed: {}", err);
            FlowchartOutput::failure(err)
        }
    }
}

/// Like [`generate_all_flowcharts`], keeping the error typed
pub fn try_generate(
    source: &str,
    language: Language,
) -> Result<(Flowcharts, Option<Vec<i64>>), FlowchartError> {
    match language {
        Language::Algo => Ok((parse_and_lower(source)?, None)),
        Language::C => {
            let translation = usdb_translator::translate_c_to_algo(source, None);
            if !translation.success {
                let reason = translation
                    .errors
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "nothing to translate".to_string());
                return Err(FlowchartError::Translation(reason));
            }
            let mut charts = parse_and_lower(&translation.algo_code).map_err(|err| {
                FlowchartError::Translation(format!("translated code does not parse: {}", err))
            })?;
            remap_spans(&mut charts.main, &translation.source_map);
            for set in charts.subroutines.values_mut() {
                remap_spans(set, &translation.source_map);
            }
            Ok((charts, Some(translation.source_map)))
        }
    }
}

fn parse_and_lower(source: &str) -> Result<Flowcharts, FlowchartError> {
    let output = usdb_parser::parse(source);
    match (output.ast, output.errors.first()) {
        (Some(program), None) => Ok(lower_program(&program)),
        (_, Some(err)) => {
            let location = err.location();
            Err(FlowchartError::Parse {
                message: err.to_string(),
                line: location.line,
                column: location.column,
            })
        }
        (None, None) => Err(FlowchartError::Parse {
            message: "no program".to_string(),
            line: 1,
            column: 1,
        }),
    }
}

/// Point node spans at C lines; nodes whose Algo line has no C origin lose their span
fn remap_spans(set: &mut FlowchartSet, source_map: &[i64]) {
    let c_line = |algo_line: usize| -> Option<usize> {
        let entry = *source_map.get(algo_line.checked_sub(1)?)?;
        usize::try_from(entry).ok()
    };
    for node in &mut set.nodes {
        node.span = node.span.and_then(|span| {
            let start = c_line(span.start.line)?;
            let end = c_line(span.end.line).unwrap_or(start).max(start);
            Some(Span::new(Location::new(start, 1, 0), Location::new(end, 1, 0)))
        });
    }
}
