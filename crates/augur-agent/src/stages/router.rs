use tracing::debug;

use augur_tools::ToolKind;

use crate::state::{PipelineState, Route};

/// Keyword table, checked in order. The first row with a hit wins.
const KEYWORD_ROUTES: &[(&[&str], Route)] = &[
    (&["占卜", "卦", "吉凶", "周易", "易经"], Route::Action(ToolKind::IChing)),
    (&["星座", "运势"], Route::Action(ToolKind::Horoscope)),
    (&["生肖", "属相", "属什么"], Route::Action(ToolKind::Zodiac)),
    (&["八字", "四柱", "命盘"], Route::Action(ToolKind::BaZi)),
    (&["起名", "取名", "名字建议"], Route::Action(ToolKind::Naming)),
    (&["知识", "介绍", "是什么", "含义", "典故", "历史"], Route::Retrieve),
];

/// Classify a question by keyword. Anything unmatched is plain chat.
pub fn classify(question: &str) -> Route {
    KEYWORD_ROUTES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| question.contains(k)))
        .map(|(_, route)| *route)
        .unwrap_or(Route::Generate)
}

pub fn route(state: &mut PipelineState) {
    let route = classify(&state.question);
    debug!(route = %route, "Routed question");
    state.next_step = Some(route);
}
