/*!

This is the long-form manual for `apportionment` and the `apportion` command line.

## Allocation rules

### `proportional`

Seats are allocated proportionally to the population with the Hamilton method
(also called largest remainder). Every region first receives the integer part
of its quota `population / total population * seats`, and the seats left are
given to the regions with the largest fractional parts.

When two regions have exactly the same fractional part and only one seat is
left for them, the region listed first in the input wins the seat. The order
of the population file therefore matters in this (rare) situation.

### `dp_alpha_<α>`

Degressive proportional allocation. The population of each region is replaced
by `population^α` before running the Hamilton method. With `α = 1` this is
exactly the proportional allocation. Smaller values of `α` transfer seats from
the large regions to the small ones. `α` must be in `(0, 1]`.

## Indicators

For every region:

| indicator           | definition                              |
|---------------------|-----------------------------------------|
| `seats_per_million` | seats / (population / 1,000,000)        |
| `rep_ratio`         | same as `seats_per_million`             |
| `elasticity`        | seat share / population share           |

An elasticity above 1 means that the region is over-represented.
Indicators that would divide by zero (a region without population) are left
empty in the output.

For every allocation:

- `MI_seats_per_million`: the malapportionment index, half of the sum of the
  absolute deviations of the seats per person of each region from the national
  average, expressed per million.
- `Gini_seats_per_million`: the Gini coefficient of the seats per million.
  0 means that every region is represented with the same intensity.
- `mean_elasticity`, `median_elasticity`, `p10_elasticity`, `p90_elasticity`.
- `mrc_mean_abs_rel_change`: for the degressive allocations only, the mean of
  the absolute relative changes of the seats per million compared to the
  proportional allocation.

## Input formats

### Population

```text
state,population
Kerala,35699443
Goa,1586250
```

Populations must be finite numbers, zero or above. `nan` or `inf` is rejected
with the line and the region.

### Allocations

The files written by `apportion allocate`. Any CSV with a state column
(`state`, `state_name` or `region`) and a seats column (`seats`, `seat`,
`allocated` or `allocation`) is accepted. The regions that are missing from an
allocation are counted with 0 seats, and a warning is printed.

### Raw population tables

`apportion clean` accepts tables with other column names and tries, in order:
- a population column named `population`, `pop`, `population_total`,
  `total_population` or `persons`, else the numeric column with the largest sum;
- a state column named `state`, `state_name`, `region` or `unit`, else the first
  non numeric column.

Populations are multiplied by `--scale` (default 10,000,000: crores to persons)
when `--force-scale` is passed or when their mean is below one million.

## Configuration

All the commands accept a configuration file in JSON with `--config`. All the
fields are optional, and the command line flags take precedence. `clean` reads
`rawDirectory` and writes `processedDirectory`.

```text
{
  "seats": 543,
  "alphas": [0.4, 0.5, 0.6, 0.8, 0.9],
  "populationFile": "data/processed/pop_2036_clean.csv",
  "outputDirectory": "data/outputs",
  "allocationDirectory": "data/outputs",
  "annexureDirectory": "annexures",
  "rawDirectory": "data/raw",
  "processedDirectory": "data/processed",
  "canonicalFile": "docs/states_canonical.csv",
  "scale": 10000000
}
```

 */
