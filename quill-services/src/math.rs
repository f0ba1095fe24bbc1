//! Math service: basic arithmetic and statistics over number lists

use quill_registry::prelude::*;

pub struct MathService;

static ADD_PARAMS: [ParamMeta; 2] = [
    ParamMeta::required("a", "Number", "First addend"),
    ParamMeta::required("b", "Number", "Second addend"),
];
static LIST_PARAMS: [ParamMeta; 1] =
    [ParamMeta::required("numbers", "List", "List of numbers, must not be empty")];
static POWER_PARAMS: [ParamMeta; 2] = [
    ParamMeta::required("base", "Number", "Base"),
    ParamMeta::required("exponent", "Number", "Exponent"),
];
static SQRT_PARAMS: [ParamMeta; 1] =
    [ParamMeta::required("number", "Number", "Number, must not be negative")];
static ABS_PARAMS: [ParamMeta; 1] = [ParamMeta::required("number", "Number", "Number")];
static ROUND_PARAMS: [ParamMeta; 2] = [
    ParamMeta::required("number", "Number", "Number to round"),
    ParamMeta::optional("digits", "Number", "Decimal places to keep", "0"),
];

static MATH_METHODS: [MethodMeta; 12] = [
    MethodMeta::new(
        "add",
        "Adds two numbers",
        "result = math.add(2, 3)",
        "Basic Math",
        &ADD_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "sum",
        "Sums a list of numbers",
        "total = math.sum([1, 2, 3, 4, 5])",
        "Basic Math",
        &LIST_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "average",
        "Arithmetic mean of a list of numbers",
        "avg = math.average([1, 2, 3, 4, 5])",
        "Statistics",
        &LIST_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "min_of",
        "Smallest number in a list",
        "low = math.min_of([1, 5, 3, 9, 2])",
        "Statistics",
        &LIST_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "max_of",
        "Largest number in a list",
        "high = math.max_of([1, 5, 3, 9, 2])",
        "Statistics",
        &LIST_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "median",
        "Median of a list of numbers",
        "mid = math.median([1, 3, 5, 7, 9])",
        "Statistics",
        &LIST_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "standard_deviation",
        "Population standard deviation of a list of numbers",
        "std = math.standard_deviation([1, 2, 3, 4, 5])",
        "Statistics",
        &LIST_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "power",
        "Raises a base to an exponent",
        "result = math.power(2, 8)",
        "Basic Math",
        &POWER_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "sqrt",
        "Square root of a non-negative number",
        "root = math.sqrt(16)",
        "Basic Math",
        &SQRT_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "abs",
        "Absolute value of a number",
        "magnitude = math.abs(-5)",
        "Basic Math",
        &ABS_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "round",
        "Rounds a number to the given decimal places",
        "rounded = math.round(3.14159, 2)",
        "Basic Math",
        &ROUND_PARAMS,
        "Number",
    ),
    MethodMeta::new(
        "avg",
        "Arithmetic mean of a list of numbers",
        "avg = math.avg([1, 2, 3])",
        "Statistics",
        &LIST_PARAMS,
        "Number",
    )
    .deprecated("use math.average instead"),
];

impl ScriptService for MathService {
    fn meta(&self) -> ServiceMeta {
        ServiceMeta {
            name: "math",
            version: "1.0.0",
            description: "Math helpers: arithmetic and list statistics",
            core: false,
            methods: &MATH_METHODS,
            properties: &[],
        }
    }

    fn call(&self, method: &str, args: &[Value]) -> Result<Value, ServiceError> {
        match method {
            "add" => {
                if args.len() != 2 {
                    return Err(ServiceError::arg_count("add", 2, args.len()));
                }
                let a = number_arg("add", "a", &args[0])?;
                let b = number_arg("add", "b", &args[1])?;
                Ok(Value::Number(a + b))
            }
            "sum" => {
                let numbers = list_arg(method, args, false)?;
                Ok(Value::Number(numbers.iter().sum()))
            }
            "average" | "avg" => {
                let numbers = list_arg(method, args, true)?;
                Ok(Value::Number(numbers.iter().sum::<f64>() / numbers.len() as f64))
            }
            "min_of" => {
                let numbers = list_arg(method, args, true)?;
                Ok(Value::Number(numbers.iter().cloned().fold(f64::INFINITY, f64::min)))
            }
            "max_of" => {
                let numbers = list_arg(method, args, true)?;
                Ok(Value::Number(
                    numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                ))
            }
            "median" => {
                let mut numbers = list_arg(method, args, true)?;
                numbers.sort_by(|a, b| a.total_cmp(b));
                let n = numbers.len();
                let median = if n % 2 == 0 {
                    (numbers[n / 2 - 1] + numbers[n / 2]) / 2.0
                } else {
                    numbers[n / 2]
                };
                Ok(Value::Number(median))
            }
            "standard_deviation" => {
                let numbers = list_arg(method, args, true)?;
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                let variance = numbers.iter().map(|n| (n - mean).powi(2)).sum::<f64>()
                    / numbers.len() as f64;
                Ok(Value::Number(variance.sqrt()))
            }
            "power" => {
                if args.len() != 2 {
                    return Err(ServiceError::arg_count("power", 2, args.len()));
                }
                let base = number_arg("power", "base", &args[0])?;
                let exponent = number_arg("power", "exponent", &args[1])?;
                Ok(Value::Number(base.powf(exponent)))
            }
            "sqrt" => {
                if args.len() != 1 {
                    return Err(ServiceError::arg_count("sqrt", 1, args.len()));
                }
                let n = number_arg("sqrt", "number", &args[0])?;
                if n < 0.0 {
                    return Err(ServiceError::failed("sqrt: number must not be negative"));
                }
                Ok(Value::Number(n.sqrt()))
            }
            "abs" => {
                if args.len() != 1 {
                    return Err(ServiceError::arg_count("abs", 1, args.len()));
                }
                let n = number_arg("abs", "number", &args[0])?;
                Ok(Value::Number(n.abs()))
            }
            "round" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(ServiceError::arg_count("round", 1, args.len()));
                }
                let n = number_arg("round", "number", &args[0])?;
                let digits = match args.get(1) {
                    Some(value) => number_arg("round", "digits", value)? as i32,
                    None => 0,
                };
                let factor = 10f64.powi(digits);
                Ok(Value::Number((n * factor).round() / factor))
            }
            other => Err(ServiceError::unknown_method("math", other)),
        }
    }
}

fn number_arg(method: &str, param: &str, value: &Value) -> Result<f64, ServiceError> {
    value
        .as_number()
        .ok_or_else(|| ServiceError::arg_type(method, param, "Number", value.type_name()))
}

/// Single list-of-numbers argument shared by the statistics methods
fn list_arg(method: &str, args: &[Value], non_empty: bool) -> Result<Vec<f64>, ServiceError> {
    if args.len() != 1 {
        return Err(ServiceError::arg_count(method, 1, args.len()));
    }
    let items = args[0]
        .as_list()
        .ok_or_else(|| ServiceError::arg_type(method, "numbers", "List", args[0].type_name()))?;
    let mut numbers = Vec::with_capacity(items.len());
    for item in items {
        numbers.push(number_arg(method, "numbers", item)?);
    }
    if non_empty && numbers.is_empty() {
        return Err(ServiceError::failed(format!("{}: list must not be empty", method)));
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num_list(values: &[f64]) -> Value {
        Value::List(values.iter().map(|n| Value::Number(*n)).collect())
    }

    #[test]
    fn test_add() {
        let result = MathService
            .call("add", &[Value::Number(2.0), Value::Number(3.0)])
            .unwrap();
        assert_eq!(result, Value::Number(5.0));
    }

    #[test]
    fn test_add_wrong_arity() {
        assert!(MathService.call("add", &[Value::Number(2.0)]).is_err());
    }

    #[test]
    fn test_average() {
        let result = MathService
            .call("average", &[num_list(&[1.0, 2.0, 3.0, 4.0, 5.0])])
            .unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_average_empty_list() {
        assert!(MathService.call("average", &[Value::List(vec![])]).is_err());
    }

    #[test]
    fn test_median_even_count() {
        let result = MathService
            .call("median", &[num_list(&[1.0, 3.0, 5.0, 7.0])])
            .unwrap();
        assert_eq!(result, Value::Number(4.0));
    }

    #[test]
    fn test_min_max() {
        let list = num_list(&[4.0, -1.0, 9.0]);
        assert_eq!(
            MathService.call("min_of", &[list.clone()]).unwrap(),
            Value::Number(-1.0)
        );
        assert_eq!(
            MathService.call("max_of", &[list]).unwrap(),
            Value::Number(9.0)
        );
    }

    #[test]
    fn test_standard_deviation() {
        let result = MathService
            .call("standard_deviation", &[num_list(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])])
            .unwrap();
        assert_eq!(result, Value::Number(2.0));
    }

    #[test]
    fn test_power_and_sqrt() {
        assert_eq!(
            MathService
                .call("power", &[Value::Number(2.0), Value::Number(8.0)])
                .unwrap(),
            Value::Number(256.0)
        );
        assert_eq!(
            MathService.call("sqrt", &[Value::Number(16.0)]).unwrap(),
            Value::Number(4.0)
        );
        assert!(MathService.call("sqrt", &[Value::Number(-1.0)]).is_err());
    }

    #[test]
    fn test_abs() {
        assert_eq!(
            MathService.call("abs", &[Value::Number(-5.0)]).unwrap(),
            Value::Number(5.0)
        );
    }

    #[test]
    fn test_round_with_optional_digits() {
        assert_eq!(
            MathService
                .call("round", &[Value::Number(3.14159), Value::Number(2.0)])
                .unwrap(),
            Value::Number(3.14)
        );
        assert_eq!(
            MathService.call("round", &[Value::Number(2.5)]).unwrap(),
            Value::Number(3.0)
        );
    }

    #[test]
    fn test_deprecated_alias_flagged() {
        let meta = MathService.meta();
        let avg = meta.methods.iter().find(|m| m.name == "avg").unwrap();
        assert!(avg.deprecated.is_some());
    }
}
