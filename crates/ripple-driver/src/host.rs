//! Host bindings for `ripple run`.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use eyre::{bail, eyre, Result, WrapErr};
use ripple_ir::interp::{Interpreter, Trap, Value};
use ripple_ir::{IrFunction, IrModule, IrType};

/// Binds every import of `module` to a host that writes `name(arg, ...)` to
/// `out` and returns the zero value of its result type.
pub fn bind_printing_hosts<W: Write + 'static>(
    interp: &mut Interpreter<'_>,
    module: &IrModule,
    out: Rc<RefCell<W>>,
) -> Result<(), Trap> {
    for import in &module.imports {
        let name = import.name.clone();
        let result = Value::zero(import.result);
        let out = Rc::clone(&out);
        interp.register_host(
            &import.name,
            move |args: &[Value]| -> Result<Option<Value>, Trap> {
                let args: Vec<String> = args.iter().map(Value::to_string).collect();
                writeln!(out.borrow_mut(), "{}({})", name, args.join(", "))
                    .map_err(|err| Trap::Host(err.to_string()))?;
                Ok(result)
            },
        )?;
    }
    Ok(())
}

/// Parses command-line arguments against `func`'s parameter types.
pub fn parse_args(func: &IrFunction, args: &[String]) -> Result<Vec<Value>> {
    if func.params.len() != args.len() {
        bail!(
            "function `{}` takes {} argument(s), {} given",
            func.name,
            func.params.len(),
            args.len()
        );
    }
    func.params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (&ty, arg))| {
            parse_value(ty, arg).wrap_err_with(|| format!("argument {} of `{}`", index, func.name))
        })
        .collect()
}

fn parse_value(ty: IrType, text: &str) -> Result<Value> {
    let invalid = || format!("`{}` is not an {}", text, ty);
    let value = match ty {
        IrType::I32 => Value::I32(text.parse().wrap_err_with(invalid)?),
        IrType::I64 => Value::I64(text.parse().wrap_err_with(invalid)?),
        IrType::F32 => Value::F32(text.parse().wrap_err_with(invalid)?),
        IrType::F64 => Value::F64(text.parse().wrap_err_with(invalid)?),
        IrType::None => return Err(eyre!("parameters cannot have no type")),
    };
    Ok(value)
}
