/// Pull the entry-point method name out of an Apex debug log body.
///
/// Execution logs open each unit with a line like
/// `12:00:01.2 (2345)|CODE_UNIT_STARTED|[EXTERNAL]|01pxx0000001|InvoiceService.recalculate`.
/// The first such line names the outermost unit, which is what the panel
/// shows next to a log.
pub fn extract_entry_method(body: &str) -> Option<String> {
    for line in body.lines() {
        let mut fields = line.split('|');
        if fields.nth(1) != Some("CODE_UNIT_STARTED") {
            continue;
        }

        let unit = line.rsplit('|').next()?.trim();
        // Trigger units carry an id prefix, such as `__sfdc_trigger/InvoiceTrigger`.
        let unit = unit.rsplit('/').next().unwrap_or(unit);
        let unit = unit.trim_end_matches("()");

        if !unit.is_empty() {
            return Some(unit.to_string());
        }
    }

    None
}
