use crate::domain::model::PaperRecord;
use crate::domain::ports::GenerationRequest;

/// 生成階段的角色設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Analysis,
    Writing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Writing => "writing",
        }
    }

    fn role(&self) -> &'static str {
        match self {
            Self::Analysis => "Paper Analyst",
            Self::Writing => "Content Writer",
        }
    }

    fn backstory(&self) -> &'static str {
        match self {
            Self::Analysis => {
                "With a keen eye for detail, you excel at breaking down complex research papers \
                 and identifying the most important information."
            }
            Self::Writing => {
                "A master of words, you create compelling narratives that make research \
                 accessible and interesting."
            }
        }
    }

    fn goal(&self, topic: &str) -> String {
        match self {
            Self::Analysis => format!(
                "Thoroughly read each research paper on {} and extract key insights.",
                topic
            ),
            Self::Writing => format!(
                "Craft engaging summaries of research papers on {} in Markdown format.",
                topic
            ),
        }
    }

    pub fn system_prompt(&self, topic: &str) -> String {
        format!(
            "You are a {}. {}\nYour goal: {}",
            self.role(),
            self.backstory(),
            self.goal(topic)
        )
    }
}

fn paper_header(paper: &PaperRecord) -> String {
    let date_note = if paper.has_reliable_date() {
        ""
    } else {
        " (approximate)"
    };
    format!(
        "Title: {}\nLink: {}\nPublished: {}{}",
        paper.title, paper.link, paper.published, date_note
    )
}

pub fn analysis_request(topic: &str, paper: &PaperRecord) -> GenerationRequest {
    GenerationRequest {
        system: Stage::Analysis.system_prompt(topic),
        prompt: format!(
            "Read the paper below on {} thoroughly and extract its key points, methodologies, \
             and findings. Write a long, detailed summary.\n\n{}",
            topic,
            paper_header(paper)
        ),
    }
}

pub fn writing_request(topic: &str, paper: &PaperRecord, analysis: &str) -> GenerationRequest {
    GenerationRequest {
        system: Stage::Writing.system_prompt(topic),
        prompt: format!(
            "Write a long, engaging summary of the paper below on {} suitable for LinkedIn, \
             highlighting its importance and impact in the field. Use Markdown but do not repeat \
             the title, date or link as a heading.\n\n{}\n\nAnalyst notes:\n{}",
            topic,
            paper_header(paper),
            analysis.trim()
        ),
    }
}
