// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use perf_pane::{ChartPaneState, PaneStateRecord};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(state) = ChartPaneState::from_json_str(raw) {
        let link = state.to_positional();
        let again = ChartPaneState::from_positional(&link)
            .expect("an encoded link must decode again");
        assert_eq!(again.to_positional(), link, "re-encoding must be stable");

        let record = PaneStateRecord::from_state(&again);
        let _ = record.into_state();
    }

    if let Ok(record) = serde_json::from_str::<PaneStateRecord>(raw) {
        let _ = record.into_state_parts();
    }
});
