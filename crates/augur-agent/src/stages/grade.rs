use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use augur_core::config::{GraderKind, PipelineConfig};

use super::PipelineDeps;
use crate::state::{PipelineState, Route};

/// Outcome of grading one retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Relevant,
    Refine,
}

/// Decides whether retrieved documents are good enough to answer from.
pub trait DocumentGrader: Send + Sync {
    fn name(&self) -> &str;
    fn grade(&self, question: &str, documents: &[String]) -> Verdict;
}

/// Accepts every retrieval.
pub struct PassThroughGrader;

impl DocumentGrader for PassThroughGrader {
    fn name(&self) -> &str {
        "pass_through"
    }

    fn grade(&self, _question: &str, _documents: &[String]) -> Verdict {
        Verdict::Relevant
    }
}

/// Relevant when some real document shares a term with the question.
///
/// Terms are CJK character bigrams and lowercased ASCII words of three or
/// more letters. The fallback context never counts as a real document.
pub struct LexicalGrader {
    fallback_context: String,
}

impl LexicalGrader {
    pub fn new(fallback_context: impl Into<String>) -> Self {
        Self {
            fallback_context: fallback_context.into(),
        }
    }
}

impl DocumentGrader for LexicalGrader {
    fn name(&self) -> &str {
        "lexical"
    }

    fn grade(&self, question: &str, documents: &[String]) -> Verdict {
        let wanted = terms(question);
        if wanted.is_empty() {
            return Verdict::Relevant;
        }
        let hit = documents
            .iter()
            .filter(|d| **d != self.fallback_context)
            .any(|d| !terms(d).is_disjoint(&wanted));
        if hit {
            Verdict::Relevant
        } else {
            Verdict::Refine
        }
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

fn terms(text: &str) -> HashSet<String> {
    let mut out = HashSet::new();

    let chars: Vec<char> = text.chars().collect();
    for pair in chars.windows(2) {
        if is_cjk(pair[0]) && is_cjk(pair[1]) {
            out.insert(pair.iter().collect());
        }
    }

    for word in text.split(|c: char| !c.is_ascii_alphanumeric()) {
        if word.len() >= 3 {
            out.insert(word.to_ascii_lowercase());
        }
    }
    out
}

pub fn grader_from_config(config: &PipelineConfig) -> Arc<dyn DocumentGrader> {
    match config.grader {
        GraderKind::PassThrough => Arc::new(PassThroughGrader),
        GraderKind::Lexical => Arc::new(LexicalGrader::new(config.fallback_context.clone())),
    }
}

/// Set `next_step` to generate or transform_query. Once the refinement
/// budget is spent the grader is not consulted.
pub fn grade_documents(deps: &PipelineDeps, state: &mut PipelineState) {
    if state.refinements >= deps.pipeline.max_refinements {
        debug!(refinements = state.refinements, "Refinement budget spent, generating");
        state.next_step = Some(Route::Generate);
        return;
    }

    let verdict = deps.grader.grade(&state.question, &state.documents);
    debug!(grader = deps.grader.name(), verdict = ?verdict, "Graded documents");
    state.next_step = Some(match verdict {
        Verdict::Relevant => Route::Generate,
        Verdict::Refine => Route::TransformQuery,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "暂无相关文档，请直接回答用户问题。";

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pass_through_always_relevant() {
        assert_eq!(PassThroughGrader.grade("anything", &[]), Verdict::Relevant);
    }

    #[test]
    fn test_lexical_cjk_overlap() {
        let grader = LexicalGrader::new(FALLBACK);
        let verdict = grader.grade("论语讲了什么", &docs(&["《论语》是孔子弟子所记。"]));
        assert_eq!(verdict, Verdict::Relevant);
    }

    #[test]
    fn test_lexical_ascii_overlap_ignores_case() {
        let grader = LexicalGrader::new(FALLBACK);
        assert_eq!(
            grader.grade("What is the Analects?", &docs(&["the analects of confucius"])),
            Verdict::Relevant
        );
        assert_eq!(
            grader.grade("What is it?", &docs(&["an unrelated passage"])),
            Verdict::Refine
        );
    }

    #[test]
    fn test_lexical_ignores_fallback_context() {
        let grader = LexicalGrader::new(FALLBACK);
        // The fallback shares 文档 with this question but must not count
        assert_eq!(grader.grade("相关文档在哪", &docs(&[FALLBACK])), Verdict::Refine);
    }

    #[test]
    fn test_lexical_question_without_terms() {
        let grader = LexicalGrader::new(FALLBACK);
        assert_eq!(grader.grade("?", &docs(&["x"])), Verdict::Relevant);
    }

    #[test]
    fn test_grader_from_config() {
        let mut config = PipelineConfig::default();
        assert_eq!(grader_from_config(&config).name(), "pass_through");
        config.grader = GraderKind::Lexical;
        assert_eq!(grader_from_config(&config).name(), "lexical");
    }
}
