use std::error::Error;

use rust_decimal::Decimal;
use tabled::{builder::Builder, settings::Style};
use till::money::format_amount;
use till_app::context::AppContext;

/// Print `rows` as a table under `header`, or a note when there are none.
pub(crate) fn print_table<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) {
    if rows.is_empty() {
        println!("nothing found");
        return;
    }

    let mut builder = Builder::default();

    builder.push_record(header);

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();

    table.with(Style::sharp());

    println!("{table}");
}

pub(crate) fn money(ctx: &AppContext, amount: Decimal) -> String {
    format_amount(amount, ctx.currency)
}

/// Error message followed by each of its sources.
pub(crate) fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
