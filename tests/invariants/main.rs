//! Behavior checks that must hold for any input, exercised over small
//! hand-written compilations.
//!
//! Run with: cargo test --test invariants

use contractor::marker::MARKER_FRAGMENT_NAME;
use contractor::{Pipeline, RunResult, SourceUnit};
use libtest_mimic::{Arguments, Failed, Trial};

fn main() {
    let args = Arguments::from_args();
    let tests = vec![
        Trial::test("unmarked_interfaces_never_contribute", unmarked_interfaces_never_contribute),
        Trial::test("one_accessor_per_distinct_name", one_accessor_per_distinct_name),
        Trial::test("rerun_is_byte_identical", rerun_is_byte_identical),
        Trial::test("marking_site_does_not_change_member_set", marking_site_does_not_change_member_set),
        Trial::test("emission_follows_declaration_order", emission_follows_declaration_order),
    ];
    libtest_mimic::run(&args, tests).exit();
}

fn run(sources: &[(&str, &str)]) -> RunResult {
    let units = sources
        .iter()
        .map(|(name, text)| SourceUnit::new(*name, *text))
        .collect();
    Pipeline::standard().run(units)
}

fn unmarked_interfaces_never_contribute() -> Result<(), Failed> {
    let result = run(&[(
        "Program.cs",
        r#"
namespace Demo
{
    interface IPlain
    {
        int Value { get; }
    }

    partial class Holder : IPlain
    {
    }
}
"#,
    )]);

    if result.has_errors() {
        return Err(format!("unexpected diagnostics: {:?}", result.diagnostics).into());
    }
    if result.fragments.len() != 1 {
        return Err(format!(
            "expected only the marker fragment, got {} fragments",
            result.fragments.len()
        )
        .into());
    }
    Ok(())
}

fn one_accessor_per_distinct_name() -> Result<(), Failed> {
    let result = run(&[(
        "Program.cs",
        r#"
using Contractor;

namespace Demo
{
    [AutoImplement]
    interface IAlpha
    {
        string Name { get; }
        int Age { get; }
    }

    [AutoImplement]
    interface IBeta
    {
        string Name { get; }
        bool Active { get; }
    }

    partial class Person : IAlpha, IBeta
    {
    }
}
"#,
    )]);

    let fragment = result
        .fragment("Demo.Person.Generated.cs")
        .ok_or("missing fragment for Demo.Person")?;

    let name_count = fragment.code.matches("string Name").count();
    if name_count != 1 {
        return Err(format!("expected one Name accessor, found {}", name_count).into());
    }
    if !fragment.code.contains("int Age") || !fragment.code.contains("bool Active") {
        return Err(format!("missing non-overlapping members:\n{}", fragment.code).into());
    }
    if !result.diagnostics.is_empty() {
        return Err(format!("unexpected diagnostics: {:?}", result.diagnostics).into());
    }
    Ok(())
}

fn rerun_is_byte_identical() -> Result<(), Failed> {
    let sources = &[
        (
            "first.cs",
            r#"
using Contractor;

namespace Demo
{
    [AutoImplement]
    partial interface IThing
    {
        int Width { get; }
    }
}
"#,
        ),
        (
            "second.cs",
            r#"
namespace Demo
{
    partial interface IThing
    {
        int Height { get; }
    }

    partial class Frame : IThing
    {
    }
}
"#,
        ),
    ];

    let first = run(sources);
    let second = run(sources);

    if first.fragments.len() != second.fragments.len() {
        return Err(format!(
            "fragment count drifted between runs: {} vs {}",
            first.fragments.len(),
            second.fragments.len()
        )
        .into());
    }
    for (a, b) in first.fragments.iter().zip(second.fragments.iter()) {
        if a.name != b.name {
            return Err(format!("fragment order drifted: {} vs {}", a.name, b.name).into());
        }
        if a.code != b.code {
            return Err(format!("fragment {} drifted between runs", a.name).into());
        }
    }
    Ok(())
}

fn marking_site_does_not_change_member_set() -> Result<(), Failed> {
    // The attribute sits on the first partial declaration here and on the
    // second one below. Both runs must generate the same fragment.
    let marked_first = run(&[
        (
            "first.cs",
            r#"
using Contractor;

namespace Demo
{
    [AutoImplement]
    partial interface IThing
    {
        int Width { get; }
    }
}
"#,
        ),
        (
            "second.cs",
            r#"
namespace Demo
{
    partial interface IThing
    {
        int Height { get; }
    }

    partial class Frame : IThing
    {
    }
}
"#,
        ),
    ]);

    let marked_second = run(&[
        (
            "first.cs",
            r#"
using Contractor;

namespace Demo
{
    partial interface IThing
    {
        int Width { get; }
    }
}
"#,
        ),
        (
            "second.cs",
            r#"
namespace Demo
{
    [AutoImplement]
    partial interface IThing
    {
        int Height { get; }
    }

    partial class Frame : IThing
    {
    }
}
"#,
        ),
    ]);

    let a = marked_first
        .fragment("Demo.Frame.Generated.cs")
        .ok_or("missing fragment when the first declaration is marked")?;
    let b = marked_second
        .fragment("Demo.Frame.Generated.cs")
        .ok_or("missing fragment when the second declaration is marked")?;

    if a.code != b.code {
        return Err(format!(
            "fragment depends on the marking site\n--- first marked ---\n{}\n--- second marked ---\n{}",
            a.code, b.code
        )
        .into());
    }
    Ok(())
}

fn emission_follows_declaration_order() -> Result<(), Failed> {
    let result = run(&[(
        "Program.cs",
        r#"
using Contractor;

namespace Demo
{
    [AutoImplement]
    interface IMarked
    {
        int Value { get; }
    }

    partial class Zed : IMarked
    {
    }

    partial class Alpha : IMarked
    {
    }
}
"#,
    )]);

    let names: Vec<&str> = result.fragments.iter().map(|f| f.name.as_str()).collect();
    let expected = [
        MARKER_FRAGMENT_NAME,
        "Demo.Zed.Generated.cs",
        "Demo.Alpha.Generated.cs",
    ];
    if names != expected {
        return Err(format!("fragment order {:?}, expected {:?}", names, expected).into());
    }
    Ok(())
}
