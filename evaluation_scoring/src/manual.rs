/*!

This is the long-form manual for `evaluation_scoring` and `evalreport`.

## Input layout

Responses are read as a table with one header row and one row per respondent.
The exports of Google Forms and Microsoft Forms both follow this layout:

| Timestamp | Question 1 | Question 2 | ... | General comments |
|-----------|------------|------------|-----|------------------|
| ...       | Excellent  | Good       | ... | Great course     |

The question columns are found by **position**, not by name: the faculty
evaluation uses the columns 2 to 9 (0-based range `1..9`) and the course
evaluation the columns 2 to 5 (`1..5`). If the questions of a form move, the
report will silently score other columns, so keep the column order of the
form stable.

Some forms repeat the question in each answer, as in `Clarity: Excellent`.
A column is treated this way when its first non-empty answer contains `": "`.
The rating is then the part after the first `": "`.

## Matching ratings

Ratings are compared to the categories exactly, by default. `"Excellent "`
(trailing space) or `"excellent"` are then not counted in the charts and are
reported as unmapped in the scores. `MatchPolicy::TrimCaseInsensitive`
ignores the surrounding spaces and the case of both sides.

## Scores

For each question, the average is the mean of the weights of its ratings.
Questions without any valid rating have no average.

* total: sum of the averages, a question without average counting as 0
* maximum possible total: number of questions times the largest weight
* converted total: total / maximum possible total * conversion maximum
  (60 for the faculty report, 15 for the course report), 0 if there is no question
* overall average: mean of the defined averages

All computations are done in floating point. Rounding to two decimals only
happens when numbers are displayed.

## Job files

`evalreport generate --config job.json` reads a JSON file:

```json
{
  "reportType": "faculty",
  "metadata": {
    "facultyName": "Jane Doe",
    "program": "M.Ed.",
    "courseCode": "EDU 501",
    "batch": "12",
    "semester": "FALL",
    "year": 2025
  },
  "source": { "provider": "csv", "filePath": "responses.csv" },
  "output": { "outputDirectory": "out", "pdf": true, "preview": true }
}
```

The providers are `csv`, `xlsx` (with an optional `worksheetName`) and
`gsheet` (with a `url` to a spreadsheet shared with "Anyone with the link").
Relative paths are resolved from the directory of the job file.

*/
