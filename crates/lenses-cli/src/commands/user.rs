use crate::client::{AppContext, CliResult, classify};
use crate::output::print_json;

/// Prints the signed-in user; sessions opened with a token have none.
pub(crate) fn handle_user(ctx: &AppContext) -> CliResult<()> {
    let user = ctx.client.user();
    if user.id.is_empty() {
        return Ok(());
    }
    print_json(&ctx.output, user)
}

pub(crate) async fn handle_license(ctx: &AppContext) -> CliResult<()> {
    let license = ctx.client.get_license_info().await.map_err(classify)?;
    print_json(&ctx.output, &license)
}
