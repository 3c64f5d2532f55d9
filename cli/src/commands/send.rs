use counter_dapp::{
    Dispatch, Error as DappError, Invalidation, ParamType, Token, TxOverrides, WriteHook, U256,
};

use crate::{
    backend::Backend,
    cli::SendArgs,
    commands,
    config::Settings,
    error::{CliError, Result},
    ui,
};

pub async fn run(settings: &Settings, args: SendArgs) -> Result<()> {
    let backend = Backend::with_wallet(settings).await?;
    let function = backend.binding.function(&args.method)?;

    let kinds = function.input_types().map_err(DappError::from)?;
    if kinds.len() != args.args.len() {
        return Err(CliError::InvalidArgument {
            what: "arguments",
            input: args.args.join(" "),
            reason: format!(
                "'{}' expects {} argument(s), got {}",
                function.signature(),
                kinds.len(),
                args.args.len()
            ),
        });
    }
    let tokens = kinds
        .iter()
        .zip(&args.args)
        .map(|(kind, text)| Token::parse(*kind, text))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(DappError::from)?;

    let overrides = TxOverrides {
        value: args.value.as_deref().map(parse_quantity).transpose()?,
        gas: args.gas.as_deref().map(parse_quantity).transpose()?,
    };

    let invalidation = Invalidation::new();
    let hook = WriteHook::new(
        &backend.binding,
        backend.sender(),
        &backend.session,
        &invalidation,
        &args.method,
    )?;

    ui::status(format!(
        "Sending {} to {}",
        function.signature(),
        backend.describe()
    ));
    if hook.send(&tokens, overrides)? == Dispatch::Busy {
        return Err(CliError::Message("a transaction is already in flight".to_string()));
    }

    let state = commands::follow(hook.subscribe()).await?;
    hook.unmount();

    if let Some(hash) = &state.hash {
        println!("{}", ui::format_hash(hash));
    }
    Ok(())
}

/// Parses a decimal or `0x` hex amount.
fn parse_quantity(text: &str) -> Result<U256> {
    match Token::parse(ParamType::Uint(256), text) {
        Ok(Token::Uint(value)) => Ok(value),
        Ok(_) => Err(CliError::Message(format!("'{text}' is not an amount"))),
        Err(err) => Err(DappError::from(err).into()),
    }
}
