use super::ui;
use crate::core::currency::CURRENCIES;
use comfy_table::Cell;

pub fn display_currencies() -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
    ]);
    for currency in CURRENCIES {
        table.add_row(vec![
            Cell::new(currency.code),
            Cell::new(currency.name),
            Cell::new(currency.symbol),
        ]);
    }
    table.to_string()
}

pub fn run() {
    println!("{}", display_currencies());
}
