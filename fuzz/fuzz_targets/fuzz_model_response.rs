// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use secondlook::assessment::coerce::{coerce_analysis, coerce_questions};

fuzz_target!(|data: &[u8]| {
    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(result) = coerce_analysis(content, 2) {
        assert!(result.questions.map_or(true, |q| q.len() <= 2));
        assert!(result.insights.iter().all(|i| !i.reasoning.is_empty()));
    }
    if let Ok(questions) = coerce_questions(content, 2) {
        assert!(questions.len() <= 2);
    }
});
