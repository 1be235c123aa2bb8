// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anstyle::{Color, RgbColor, Style};

const YELLOW: Color = Color::Rgb(RgbColor(245, 207, 101));
const GREEN: Color = Color::Rgb(RgbColor(72, 213, 151));
const RED: Color = Color::Rgb(RgbColor(232, 104, 134));

/// Styles shared by every daemon command line in the workspace.
pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .header(Style::new().bold().underline().fg_color(Some(YELLOW)))
        .literal(Style::new().bold().fg_color(Some(GREEN)))
        .invalid(Style::new().bold().fg_color(Some(GREEN)))
        .valid(Style::new().bold().fg_color(Some(GREEN)))
        .usage(Style::new().bold().fg_color(Some(YELLOW)))
        .error(Style::new().bold().fg_color(Some(RED)))
}
