/*!

This is the long-form manual for `chart_picker` and `chartpick`.

## How a session runs

1. **Start.** The session receives the catalog of charts, the players (in
   turn order), the size of the pool to vote from, the number of charts to
   draw, and optionally a list of required difficulties. One chart of each
   required difficulty is placed in the pool first, then the pool is filled
   at random with the other charts.
2. **Vote.** Each player downvotes one chart, in player order. Then each
   player upvotes one chart, in reverse player order: the last player to
   downvote is the first one to upvote. A vote out of turn is rejected. The
   last vote can be undone.
3. **Draw.** Once every player has voted twice, the charts are drawn one by
   one without replacement, each chart holding some tickets in a bag.
4. **Reset.** The session is dropped and a new one can start.

## Weight rules

The tickets of a chart depend on its upvotes and downvotes.

### `exponential` (default)

`ceil(100 * 2^(upvotes - downvotes))`. A chart without votes holds 100
tickets, one upvote doubles them, one downvote halves them. A chart is never
fully excluded.

```
use chart_picker::{tickets, WeightRule};

assert_eq!(tickets(WeightRule::Exponential, 4, 0, 0), 100);
assert_eq!(tickets(WeightRule::Exponential, 4, 2, 0), 400);
assert_eq!(tickets(WeightRule::Exponential, 4, 0, 2), 25);
```

### `linear`

`players + upvotes - downvotes`, never below zero. A chart that reaches twice
the number of players is picked before any random draw. A chart at zero is
only picked when all the remaining charts are at zero, in pool order.

```
use chart_picker::{tickets, WeightRule};

assert_eq!(tickets(WeightRule::Linear, 4, 0, 0), 4);
assert_eq!(tickets(WeightRule::Linear, 4, 4, 0), 8); // picked outright
assert_eq!(tickets(WeightRule::Linear, 1, 0, 1), 0); // excluded
```

## Command line

`chartpick` replays a sequence of actions against one session and prints the
state after each accepted action, as one JSON object per line.

```bash
chartpick --config session.json --script actions.json --seed 42 --out result.json
```

Without `--script`, actions are read from the standard input, one JSON object
per line:

```text
{"type": "start"}
{"type": "newVote", "payload": {"type": "downvote", "playerId": "p1", "chartId": "c3"}}
{"type": "undoVote"}
{"type": "makePicks"}
{"type": "reset"}
```

A `start` action without payload uses the settings of the configuration.

### Catalog files

Text catalogs hold one chart per line, the difficulty first, then the title,
optionally followed by ` // ` and a subtitle:

```text
11 Loituma
12 Loituma ~Hyper Mix~ // Extended
13 Loituma HARDCORE
```

Excel catalogs (`xlsx`) use the first worksheet unless `excelWorksheetName`
is given. The first row is a header, then each row holds the difficulty, the
title and an optional subtitle.

Player files hold one name per line, best player first.

Charts and players read from files get the id `<file name>-<line number>`,
for example `charts.txt-00000003`.

## Configuration

```json
{
  "howManyChartsToVoteFrom": 6,
  "howManyChartsToRandomize": 4,
  "requiredDifficulties": [12],
  "weightRule": "exponential",
  "randomSeed": "42",
  "chartSources": [{"provider": "text", "filePath": "charts.txt"}],
  "playerSources": [{"filePath": "players.txt"}]
}
```

`charts` and `players` may also be given inline, with the same shape as in
the JSON state. File paths are relative to the configuration file.

 */
