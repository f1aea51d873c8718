/*
rfunge – a Funge-98 interpreter
Copyright © 2021 Thomas Jollans

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as
published by the Free Software Foundation, either version 3 of the
License, or (at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

mod app;

use std::env;
use std::process::exit;

use app::Parsed;

fn main() {
    env_logger::init();

    let args = env::args().skip(1);
    match app::parse_args(args) {
        Parsed::PrintAndExit { message, code } => {
            if code == 0 {
                println!("{}", message);
            } else {
                eprintln!("{}", message);
            }
            exit(code);
        }
        Parsed::Run(cfg) => match app::run(cfg) {
            Ok(code) => exit(code),
            Err(e) => {
                eprintln!("{}", e);
                exit(1);
            }
        },
    }
}
