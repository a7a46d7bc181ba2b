//! Translated programs must be valid Algo

use usdb_parser::parse;
use usdb_translator::translate_c_to_algo;

fn translate_and_parse(c: &str) -> String {
    let result = translate_c_to_algo(c, None);
    assert!(result.success, "translation failed: {:?}", result.errors);
    assert_eq!(result.source_map.len(), result.algo_code.lines().count());

    let output = parse(&result.algo_code);
    assert!(
        output.errors.is_empty(),
        "translated code does not parse: {:?}\n{}",
        output.errors,
        result.algo_code
    );
    result.algo_code
}

fn trimmed_lines(code: &str) -> Vec<&str> {
    code.lines().map(str::trim).collect()
}

#[test]
fn test_student_program_parses() {
    let code = translate_and_parse(
        r#"#include <stdio.h>
#define N 5

typedef struct {
    char name[30];
    int score;
} Student;

int max(int a, int b) {
    if (a > b)
        return a;
    else
        return b;
}

void swap(int *x, int *y) {
    int t = *x;
    *x = *y;
    *y = t;
}

int main(void) {
    int values[N];
    int i, best = 0;
    Student s;
    for (i = 0; i < N; i++) {
        scanf("%d", &values[i]);
        best = max(best, values[i]);
    }
    while (best > 100) best /= 2;
    switch (best % 3) {
        case 0: printf("zero\n"); break;
        default: printf("other %d\n", best);
    }
    s.score = best;
    printf("%s: %d\n", s.name, s.score);
    return 0;
}
"#,
    );

    let lines = trimmed_lines(&code);
    assert!(lines.contains(&"FUNCTION max(a : INTEGER; b : INTEGER) : INTEGER"));
    assert!(lines.contains(&"PROCEDURE swap(VAR x : INTEGER; VAR y : INTEGER)"));
    assert!(lines.contains(&"values : ARRAY[N] OF INTEGER"));
    assert!(lines.contains(&"FOR i <- 0 TO N - 1 DO"));
    assert!(lines.contains(&"SCAN(values[i])"));
    assert!(lines.contains(&"SWITCH best MOD 3 OF"));
    assert!(lines.contains(&"PRINT(\"other \", best)"));
    assert!(lines.contains(&"PRINT(s.name, \": \", s.score)"));
}

#[test]
fn test_loops_and_strings_parse() {
    let c = r#"#include <stdio.h>
#include <stdbool.h>
#include <string.h>

const double RATE = 0.5;

double average(double v[], int n) {
    double sum = 0;
    for (int k = 0; k < n; k++)
        sum += v[k];
    return sum / n;
}

int main() {
    char name[20];
    bool done = false;
    int count = 0;
    strcpy(name, "none");
    do {
        count++;
        if (count % 2 == 0) {
            continue;
        } else if (count > 7) {
            done = true;
        }
    } while (!done && count < 10);
    for (int i = 10; i > 0; i -= 2) printf("%d\n", i);
    puts(name);
    return 0;
}
"#;
    let code = translate_and_parse(c);
    let lines = trimmed_lines(&code);
    assert!(lines.contains(&"RATE = 0.5"));
    assert!(lines.contains(&"FUNCTION average(v : ARRAY[100] OF REAL; n : INTEGER) : REAL"));
    assert!(lines.contains(&"sum <- sum + v[k]"));
    assert!(lines.contains(&"name <- \"none\""));
    assert!(lines.contains(&"WHILE (NOT done AND count < 10)"));
    assert!(lines.contains(&"FOR i <- 10 TO 1 STEP -2 DO"));

    let result = translate_c_to_algo(c, None);
    assert!(result.warnings.iter().any(|w| w.contains("continue")));
}

#[test]
fn test_braceless_nesting_closes_in_order() {
    let code = translate_and_parse(
        "int main() {\n  int i;\n  for (i = 0; i < 3; i++)\n    if (i == 1) printf(\"one\\n\");\n    else printf(\"other\\n\");\n  printf(\"done\\n\");\n}\n",
    );
    let lines = trimmed_lines(&code);
    let start = lines
        .iter()
        .position(|l| *l == "FOR i <- 0 TO 2 DO")
        .expect("FOR line");
    assert_eq!(
        &lines[start..start + 13],
        &[
            "FOR i <- 0 TO 2 DO",
            "BEGIN",
            "IF (i = 1) THEN",
            "BEGIN",
            "PRINT(\"one\")",
            "END",
            "ELSE",
            "BEGIN",
            "PRINT(\"other\")",
            "END",
            "END",
            "PRINT(\"done\")",
            "END.",
        ]
    );
}

#[test]
fn test_global_initializers_run_first() {
    let code = translate_and_parse(
        "int total = 10;\nint limits[3] = {1, 2, 3};\nint main() {\n  printf(\"%d\\n\", total);\n}\n",
    );
    let lines = trimmed_lines(&code);
    let begin = lines.iter().rposition(|l| *l == "BEGIN").expect("main BEGIN");
    assert_eq!(
        &lines[begin + 1..begin + 5],
        &["total <- 10", "limits[0] <- 1", "limits[1] <- 2", "limits[2] <- 3"]
    );
}

#[test]
fn test_source_map_points_at_c_lines() {
    let c = "int main() {\n  int x = 2;\n\n  x = x * 3;\n  printf(\"%d\\n\", x);\n}\n";
    let result = translate_c_to_algo(c, None);
    let lines: Vec<&str> = result.algo_code.lines().collect();
    let line_of = |needle: &str| {
        let index = lines
            .iter()
            .position(|l| l.trim() == needle)
            .unwrap_or_else(|| panic!("'{}' not found", needle));
        result.source_map[index]
    };
    assert_eq!(line_of("ALGORITHM Translated"), -1);
    assert_eq!(line_of("x : INTEGER"), 2);
    assert_eq!(line_of("x <- 2"), 2);
    assert_eq!(line_of("x <- x * 3"), 4);
    assert_eq!(line_of("PRINT(x)"), 5);
    assert_eq!(line_of("END."), 6);
}

#[test]
fn test_truncated_call_reports_instead_of_failing() {
    for c in [
        "int main() {\n int x;\n x = pow(",
        "int main() {\n int x;\n x = pow(2",
        "int main() {\n int a[3];\n a[",
    ] {
        let result = translate_c_to_algo(c, None);
        assert!(!result.errors.is_empty(), "no error for {:?}", c);
        assert_eq!(result.source_map.len(), result.algo_code.lines().count());
    }
}
