//! `cartage-routes`: print a markdown table of every registered route.
//!
//! A documentation aid, not a runtime interface; the table is generated from
//! the same registry the server dispatches against.

use cartage::http::routes::render_route_table;

fn main() {
    print!("{}", render_route_table());
}
